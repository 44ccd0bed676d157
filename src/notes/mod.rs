//! Note persistence
//!
//! The `Note` entity plus the storage collaborators behind trait seams:
//! `NoteStore` for records, `ObjectStore` for audio blobs. The in-process
//! implementations are correct for a single-process deployment only; a hosted
//! database/bucket slots in by implementing the same traits.

mod model;
mod objects;
mod store;

pub use model::{NewNote, Note};
pub use objects::{MemoryObjectStore, ObjectStore};
pub use store::{MemoryNoteStore, NoteStore};
