use super::{Outcome, QueryEngine};
use crate::errors::similarity::did_you_mean;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

/// One recorded engine answer per JSONL line:
/// `{"question", "sql", "data", "warning"?}` or `{"question", "error"}`.
#[derive(Debug, Deserialize)]
struct ReplayEntry {
    question: String,
    #[serde(default)]
    sql: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    warning: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Answers from a recording instead of a live engine.
#[derive(Clone)]
pub struct ReplayEngine {
    outcomes: Arc<HashMap<String, Outcome>>,
}

impl ReplayEngine {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open replay file '{}'", path.display()))?;
        Self::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("invalid replay file '{}'", path.display()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut outcomes = HashMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ReplayEntry = serde_json::from_str(&line)
                .map_err(|e| anyhow::anyhow!("line {}: parse error: {}", i + 1, e))?;

            let outcome = match (entry.sql, entry.error) {
                (Some(sql), None) => Outcome::Success {
                    sql,
                    data: entry.data,
                    warning: entry.warning,
                },
                (None, Some(message)) => Outcome::Failure { message },
                _ => anyhow::bail!("line {}: exactly one of 'sql' or 'error' is required", i + 1),
            };

            if outcomes.insert(entry.question.clone(), outcome).is_some() {
                anyhow::bail!(
                    "line {}: duplicate recording for question '{}'",
                    i + 1,
                    entry.question
                );
            }
        }
        Ok(Self {
            outcomes: Arc::new(outcomes),
        })
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[async_trait]
impl QueryEngine for ReplayEngine {
    async fn submit(&self, question: &str) -> Outcome {
        match self.outcomes.get(question) {
            Some(outcome) => outcome.clone(),
            None => Outcome::failure(format!(
                "no recorded outcome for question '{}'{}",
                question,
                did_you_mean(question, self.outcomes.keys().map(String::as_str))
            )),
        }
    }

    fn engine_name(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RECORDING: &str = r#"
{"question": "average close 2020", "sql": "SELECT AVG(close) FROM coin_Bitcoin", "data": {"columns": ["avg_close"], "rows": [[11034.5]]}}
{"question": "DROP TABLE coin_Bitcoin", "error": "Security violation: DROP detected"}
"#;

    #[tokio::test]
    async fn replays_success_and_failure() {
        let engine = ReplayEngine::from_reader(RECORDING.as_bytes()).unwrap();
        assert_eq!(engine.len(), 2);

        match engine.submit("average close 2020").await {
            Outcome::Success { sql, data, .. } => {
                assert_eq!(sql, "SELECT AVG(close) FROM coin_Bitcoin");
                assert_eq!(data["rows"][0][0], json!(11034.5));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            engine.submit("DROP TABLE coin_Bitcoin").await,
            Outcome::failure("Security violation: DROP detected")
        );
    }

    #[tokio::test]
    async fn unknown_question_suggests_closest() {
        let engine = ReplayEngine::from_reader(RECORDING.as_bytes()).unwrap();
        let Outcome::Failure { message } = engine.submit("average close 2021").await else {
            panic!("expected failure");
        };
        assert!(message.contains("did you mean 'average close 2020'?"));
    }

    #[test]
    fn entry_needs_exactly_one_side() {
        let err = ReplayEngine::from_reader(r#"{"question": "q"}"#.as_bytes())
            .err()
            .unwrap();
        assert!(err.to_string().contains("exactly one of"));
    }

    #[test]
    fn duplicates_are_rejected() {
        let lines = "{\"question\": \"q\", \"error\": \"a\"}\n{\"question\": \"q\", \"error\": \"b\"}\n";
        let err = ReplayEngine::from_reader(lines.as_bytes()).err().unwrap();
        assert!(err.to_string().contains("duplicate recording"));
    }
}
