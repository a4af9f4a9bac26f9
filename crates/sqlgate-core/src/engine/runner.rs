use crate::classify::classify;
use crate::config::RunPolicy;
use crate::errors::EngineError;
use crate::model::{EvalResult, EvalSummary};
use crate::providers::engine::{Outcome, QueryEngine};
use crate::registry::{PreparedCase, Registry};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};

pub struct Runner {
    pub engine: Arc<dyn QueryEngine>,
    pub policy: RunPolicy,
}

impl Runner {
    pub fn new(engine: Arc<dyn QueryEngine>, policy: RunPolicy) -> Self {
        Self { engine, policy }
    }

    /// Run every case and return one result per case, in registry order.
    ///
    /// Nothing a single case does can fail the batch: engine errors,
    /// timeouts, malformed payloads and panics all land in that case's row.
    pub async fn run_suite(&self, registry: &Registry) -> EvalSummary {
        let total = registry.len();
        let started = std::time::Instant::now();
        // A deadline past what the clock can represent is no deadline.
        let deadline = self
            .policy
            .deadline
            .and_then(|d| Instant::now().checked_add(d));
        let sem = Arc::new(Semaphore::new(self.policy.parallel.max(1)));

        tracing::info!(
            event = "run_start",
            engine = self.engine.engine_name(),
            total,
            parallel = self.policy.parallel,
            timeout_s = self.policy.case_timeout.as_secs_f64(),
            deadline_s = ?self.policy.deadline.map(|d| d.as_secs_f64()),
        );

        // handles[i] belongs to registry case i; dispatch stops early only
        // at the harness deadline.
        let mut handles: Vec<JoinHandle<EvalResult>> = Vec::with_capacity(total);
        for (idx, case) in registry.cases().iter().enumerate() {
            let Some(permit) = acquire_before(&sem, deadline).await else {
                tracing::warn!(event = "deadline_reached", dispatched = idx, total);
                break;
            };
            let engine = self.engine.clone();
            let case = case.clone();
            let case_timeout = self.policy.case_timeout;
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                run_case(engine.as_ref(), &case, idx, total, case_timeout).await
            }));
        }

        let mut results = Vec::with_capacity(total);
        for (idx, case) in registry.cases().iter().enumerate() {
            let row = match handles.get_mut(idx) {
                None => EvalResult::error(
                    &case.case,
                    "harness deadline reached before this case was dispatched",
                ),
                Some(handle) => match join_before(handle, deadline).await {
                    Some(Ok(row)) => row,
                    Some(Err(e)) => {
                        tracing::error!(event = "case_crashed", index = idx + 1, error = %e);
                        EvalResult::error(&case.case, format!("case task failed: {}", e))
                    }
                    None => {
                        handle.abort();
                        EvalResult::error(
                            &case.case,
                            "harness deadline reached before this case completed",
                        )
                    }
                },
            };
            results.push(row);
        }

        let summary = EvalSummary::from_results(results);
        tracing::info!(
            event = "run_finished",
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            duration_ms = started.elapsed().as_millis() as u64,
        );
        summary
    }
}

async fn acquire_before(
    sem: &Arc<Semaphore>,
    deadline: Option<Instant>,
) -> Option<OwnedSemaphorePermit> {
    let acquire = sem.clone().acquire_owned();
    match deadline {
        None => acquire.await.ok(),
        Some(d) if Instant::now() >= d => None,
        Some(d) => timeout_at(d, acquire).await.ok()?.ok(),
    }
}

async fn join_before(
    handle: &mut JoinHandle<EvalResult>,
    deadline: Option<Instant>,
) -> Option<Result<EvalResult, tokio::task::JoinError>> {
    match deadline {
        None => Some(handle.await),
        Some(d) => timeout_at(d, handle).await.ok(),
    }
}

async fn run_case(
    engine: &dyn QueryEngine,
    case: &PreparedCase,
    idx: usize,
    total: usize,
    case_timeout: std::time::Duration,
) -> EvalResult {
    tracing::info!(
        event = "case_dispatched",
        index = idx + 1,
        total,
        question = %truncate(&case.case.question, 50),
    );
    let start = std::time::Instant::now();

    let outcome = match timeout(case_timeout, engine.submit(&case.case.question)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(event = "case_timeout", index = idx + 1, timeout_s = case_timeout.as_secs_f64());
            Outcome::from(EngineError::Timeout(case_timeout))
        }
    };
    if let Outcome::Success {
        warning: Some(w), ..
    } = &outcome
    {
        tracing::info!(event = "engine_warning", index = idx + 1, warning = %w);
    }

    let mut row = classify(case, outcome);
    row.duration_ms = Some(start.elapsed().as_millis() as u64);

    tracing::info!(
        event = "case_finished",
        index = idx + 1,
        status = %row.status,
        duration_ms = row.duration_ms,
    );
    row
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}
