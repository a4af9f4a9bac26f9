//! Deterministic in-process engine for tests and demos.

use super::{Outcome, QueryEngine};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Answer(Outcome),
    Panic,
}

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, question: &str, outcome: Outcome) -> Self {
        self.scripts
            .insert(question.to_string(), Script::Answer(outcome));
        self
    }

    pub fn succeed(self, question: &str, sql: &str, data: serde_json::Value) -> Self {
        self.answer(
            question,
            Outcome::Success {
                sql: sql.to_string(),
                data,
                warning: None,
            },
        )
    }

    pub fn reject(self, question: &str, message: &str) -> Self {
        self.answer(question, Outcome::failure(message))
    }

    /// Simulates a bug inside the engine adapter.
    pub fn panic_on(mut self, question: &str) -> Self {
        self.scripts.insert(question.to_string(), Script::Panic);
        self
    }

    pub fn delay(mut self, question: &str, delay: Duration) -> Self {
        self.delays.insert(question.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn submit(&self, question: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delays.get(question) {
            tokio::time::sleep(*d).await;
        }
        match self.scripts.get(question) {
            Some(Script::Answer(outcome)) => outcome.clone(),
            Some(Script::Panic) => panic!("scripted engine panic for '{}'", question),
            None => Outcome::failure(format!("no script for question '{}'", question)),
        }
    }

    fn engine_name(&self) -> &'static str {
        "fake"
    }
}
