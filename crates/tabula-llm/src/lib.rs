//! External model clients: natural-language-to-SQL and audio transcription.
//!
//! Both are opaque collaborators with fixed request/response contracts
//! (OpenAI-compatible chat completions and audio transcription). This crate
//! does no SQL validation of its own — generated SQL is just text that the
//! tenant chooses to run.

pub mod error;

pub use error::LlmError;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Client configuration, built once from server config and injected.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub transcribe_model: String,
}

/// Async client over an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn require_api_key(&self) -> Result<&str, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        Ok(&self.config.api_key)
    }

    /// Translate a natural-language question into SQL for the given schema.
    ///
    /// Returns the model's reply with surrounding code fences stripped;
    /// the result is not validated or executed here.
    pub async fn generate_sql(&self, question: &str, schema: &str) -> Result<String, LlmError> {
        let api_key = self.require_api_key()?;
        let prompt = sql_prompt(question, schema);

        let body = json!({
            "model": self.config.chat_model,
            "temperature": 0,
            "messages": [ChatMessage { role: "user", content: &prompt }],
        });

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("requesting SQL generation from {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: truncate(&message, 512),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        let sql = strip_code_fences(content.trim());
        if sql.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(sql)
    }

    /// Transcribe an uploaded audio file to text.
    pub async fn transcribe(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, LlmError> {
        let api_key = self.require_api_key()?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("model", self.config.transcribe_model.clone())
            .text("response_format", "text")
            .part("file", part);

        let url = format!("{}/audio/transcriptions", self.config.base_url);
        debug!("requesting transcription from {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: truncate(&text, 512),
            });
        }
        Ok(text.trim().to_string())
    }
}

/// The NL-to-SQL prompt. The schema is whatever the caller supplies —
/// usually the introspected `table(col, ...)` listing.
fn sql_prompt(question: &str, schema: &str) -> String {
    format!(
        "You are a helpful assistant that writes SQL queries.\n\n\
         Given this schema:\n{schema}\n\n\
         And this question:\n{question}\n\n\
         Return only the SQL query."
    )
}

/// Models often wrap replies in ``` fences despite instructions; unwrap them.
fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|r| r.strip_suffix("```"))
    else {
        return trimmed.to_string();
    };
    // Drop an optional language tag on the first fence line.
    let inner = inner.strip_prefix("sql").unwrap_or(inner);
    inner.trim().to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_plain() {
        assert_eq!(strip_code_fences("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_strip_code_fences_with_language_tag() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT * FROM sales\n```"),
            "SELECT * FROM sales"
        );
        assert_eq!(strip_code_fences("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_prompt_mentions_schema_and_question() {
        let prompt = sql_prompt("total sales?", "sales(id, amount)");
        assert!(prompt.contains("sales(id, amount)"));
        assert!(prompt.contains("total sales?"));
        assert!(prompt.contains("Return only the SQL query."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let short = truncate(text, 3);
        assert!(short.starts_with("h"));
        assert!(short.ends_with("…"));
        assert_eq!(truncate("abc", 10), "abc");
    }
}
