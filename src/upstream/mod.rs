//! Third-party service clients
//!
//! HTTP implementations of the boundary traits: the speech vendor's key
//! management API (short-lived streaming credentials), an OpenAI-style
//! completion endpoint (summaries), and the notes API itself as seen from a
//! client shell.

mod notes_client;
mod speech;
mod summarizer;

pub use notes_client::HttpNoteSink;
pub use speech::{HttpSpeechKeyMinter, SpeechKeyMinter};
pub use summarizer::HttpSummarizer;
