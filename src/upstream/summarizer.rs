use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::summarize::Summarizer;

const SUMMARY_PROMPT: &str = "Summarize the following voice note transcript in 1-3 concise \
sentences. Focus on the key themes and main points. Do not include any preamble or labels, \
just the summary itself.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Summaries via an OpenAI-style chat-completions endpoint.
pub struct HttpSummarizer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl HttpSummarizer {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": format!("{SUMMARY_PROMPT}\n\nTranscript:\n{transcript}"),
            }],
        });

        let url = format!(
            "{}/chat/completions",
            self.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("summarization request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "summarization failed: {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("summarization response unreadable: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Upstream("summarization returned no content".to_string()))
    }
}
