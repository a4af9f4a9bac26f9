use super::{Outcome, QueryEngine};
use crate::errors::EngineError;
use crate::model::{QueryRequest, QueryResponse};
use async_trait::async_trait;
use serde_json::Value;

pub struct HttpEngine {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl HttpEngine {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sqlgate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    async fn try_submit(&self, question: &str) -> Result<QueryResponse, EngineError> {
        let resp = self
            .client
            .post(self.query_url())
            .json(&QueryRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(EngineError::Rejected(extract_error_message(
                status.as_u16(),
                &body,
            )));
        }

        serde_json::from_str::<QueryResponse>(&body)
            .map_err(|e| EngineError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl QueryEngine for HttpEngine {
    async fn submit(&self, question: &str) -> Outcome {
        match self.try_submit(question).await {
            Ok(resp) => resp.into(),
            Err(e) => {
                tracing::debug!(event = "engine_failure", engine = "http", error = %e);
                e.into()
            }
        }
    }

    fn engine_name(&self) -> &'static str {
        "http"
    }
}

/// Human-readable message from an error body: `detail` (a string, or a list
/// of `{msg}` objects), then `message`, then `error`, then the raw body.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(msg) = v.get(key).and_then(message_text) {
                return msg;
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

fn message_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}
