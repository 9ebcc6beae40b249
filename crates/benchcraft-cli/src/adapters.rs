//! HTTP adapters for the model under test and the judge.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use benchcraft_core::{ModelClient, QueryError};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OLLAMA_API_BASE: &str = "http://localhost:11434";

/// Fixed sampling seed so reruns are comparable.
const SEED: u64 = 42;

/// Any endpoint speaking the OpenAI chat completions API (OpenAI, LM Studio,
/// LocalAI, vLLM, ...).
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model_id: String,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: &str, model_id: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model_id: model_id.to_string(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn query(&self, prompt: &str) -> Result<String> {
        debug!(endpoint = %self.endpoint, model = %self.model_id, "sending chat completion");
        let body = json!({
            "model": self.model_id,
            "messages": [{ "role": "user", "content": prompt }],
            "seed": SEED,
        });
        let v = post_json(&self.client, &self.endpoint, Some(&self.api_key), &body, self.timeout_secs).await?;

        let content = v["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| QueryError::Decode(format!("missing choices[0].message.content in {v}")))?;
        Ok(content.to_string())
    }
}

/// A local Ollama server's `/api/chat` endpoint.
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model_id: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(api_base: &str, model_id: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            endpoint: format!("{}/api/chat", api_base.trim_end_matches('/')),
            model_id: model_id.to_string(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn query(&self, prompt: &str) -> Result<String> {
        debug!(endpoint = %self.endpoint, model = %self.model_id, "sending ollama chat");
        let body = json!({
            "model": self.model_id,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": { "seed": SEED },
        });
        let v = post_json(&self.client, &self.endpoint, None, &body, self.timeout_secs).await?;

        let raw = v["message"]["content"]
            .as_str()
            .ok_or_else(|| QueryError::Decode(format!("missing message.content in {v}")))?;
        let split = split_thinking(raw.trim());
        if !split.thinking.is_empty() {
            debug!(model = %self.model_id, thinking = %split.thinking, "model reasoning");
        }
        Ok(split.answer)
    }
}

#[derive(Debug, PartialEq)]
pub struct ThinkingSplit {
    pub thinking: String,
    pub answer: String,
}

/// Separate a reasoning model's `<think>...</think>` block from its answer.
///
/// The answer is the last non-empty line after the block (or of the whole
/// text when there is no block). Falls back to the full text if that leaves
/// nothing.
pub fn split_thinking(raw: &str) -> ThinkingSplit {
    let text = raw.trim();
    let (thinking, rest) = match text.find("</think>") {
        Some(end) => {
            let thinking = text[..end].trim_start_matches("<think>").trim();
            (thinking.to_string(), &text[end + "</think>".len()..])
        }
        None => (String::new(), text),
    };

    let answer = rest
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or(text)
        .to_string();

    ThinkingSplit { thinking, answer }
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

async fn post_json(
    client: &Client,
    endpoint: &str,
    api_key: Option<&str>,
    body: &Value,
    timeout_secs: u64,
) -> Result<Value, QueryError> {
    let mut request = client.post(endpoint).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let resp = request
        .send()
        .await
        .map_err(|e| map_reqwest_error(e, timeout_secs))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(QueryError::Status {
            status: status.as_u16(),
            body,
        });
    }
    resp.json::<Value>()
        .await
        .map_err(|e| map_reqwest_error(e, timeout_secs))
}

fn map_reqwest_error(err: reqwest::Error, timeout_secs: u64) -> QueryError {
    if err.is_timeout() {
        QueryError::Timeout(timeout_secs)
    } else if err.is_decode() {
        QueryError::Decode(err.to_string())
    } else {
        QueryError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_thinking_block() {
        let split = split_thinking("<think>\nthe user repaid a meal\n</think>\n\n借贷");
        assert_eq!(split.thinking, "the user repaid a meal");
        assert_eq!(split.answer, "借贷");
    }

    #[test]
    fn test_split_without_block_takes_last_line() {
        let split = split_thinking("Let me see.\nA");
        assert_eq!(split.thinking, "");
        assert_eq!(split.answer, "A");
    }

    #[test]
    fn test_split_empty_answer_falls_back() {
        let split = split_thinking("<think>hmm</think>   ");
        assert_eq!(split.thinking, "hmm");
        assert_eq!(split.answer, "<think>hmm</think>");
    }

    #[test]
    fn test_endpoints_strip_trailing_slash() {
        let openai = OpenAiClient::new("http://localhost:8080/v1/", "k", "m", 5).unwrap();
        assert_eq!(openai.endpoint, "http://localhost:8080/v1/chat/completions");
        let ollama = OllamaClient::new(OLLAMA_API_BASE, "qwen3", 5).unwrap();
        assert_eq!(ollama.endpoint, "http://localhost:11434/api/chat");
        assert_eq!(ollama.model_id(), "qwen3");
    }
}
