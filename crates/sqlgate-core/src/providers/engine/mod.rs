use crate::errors::EngineError;
use crate::model::QueryResponse;
use async_trait::async_trait;

/// One engine invocation for one question. Exactly one side is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        sql: String,
        data: serde_json::Value,
        warning: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl Outcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

impl From<QueryResponse> for Outcome {
    fn from(resp: QueryResponse) -> Self {
        Outcome::Success {
            sql: resp.sql,
            data: resp.data,
            warning: resp.warning,
        }
    }
}

impl From<EngineError> for Outcome {
    fn from(e: EngineError) -> Self {
        Outcome::failure(e.to_string())
    }
}

/// The natural-language-to-SQL engine under test.
///
/// `submit` never fails past its boundary: transport problems, bad bodies
/// and rejections all come back as [`Outcome::Failure`]. No retries.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn submit(&self, question: &str) -> Outcome;
    fn engine_name(&self) -> &'static str;
}

pub mod fake;
pub mod http;
pub mod replay;
