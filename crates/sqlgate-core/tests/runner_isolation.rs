//! Concurrency, ordering, timeouts and failure isolation of the runner.

use async_trait::async_trait;
use serde_json::json;
use sqlgate_core::config::RunPolicy;
use sqlgate_core::engine::runner::Runner;
use sqlgate_core::model::{EvalStatus, TestCase};
use sqlgate_core::providers::engine::fake::ScriptedEngine;
use sqlgate_core::providers::engine::{Outcome, QueryEngine};
use sqlgate_core::registry::Registry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn policy(parallel: usize, timeout_s: u64, deadline_s: Option<u64>) -> RunPolicy {
    RunPolicy {
        parallel,
        case_timeout: Duration::from_secs(timeout_s),
        deadline: deadline_s.map(Duration::from_secs),
    }
}

fn ok(sql: &str) -> Outcome {
    Outcome::Success {
        sql: sql.into(),
        data: json!([]),
        warning: None,
    }
}

#[tokio::test(start_paused = true)]
async fn results_follow_registry_order_not_completion_order() {
    let engine = ScriptedEngine::new()
        .answer("slow", ok("SELECT 1"))
        .delay("slow", Duration::from_secs(3))
        .answer("medium", ok("SELECT 2"))
        .delay("medium", Duration::from_secs(2))
        .answer("fast", ok("SELECT 3"));
    let registry = Registry::from_cases(vec![
        TestCase::functional("slow"),
        TestCase::functional("medium"),
        TestCase::functional("fast"),
    ])
    .unwrap();

    let s = Runner::new(Arc::new(engine), policy(3, 30, None))
        .run_suite(&registry)
        .await;
    let order: Vec<&str> = s.results.iter().map(|r| r.question.as_str()).collect();
    assert_eq!(order, ["slow", "medium", "fast"]);
    assert!(s.all_passed());
}

#[tokio::test(start_paused = true)]
async fn slow_case_times_out_alone() {
    let engine = ScriptedEngine::new()
        .answer("hang", ok("SELECT 1"))
        .delay("hang", Duration::from_secs(60))
        .answer("quick", ok("SELECT 2"));
    let registry =
        Registry::from_cases(vec![TestCase::functional("hang"), TestCase::functional("quick")]).unwrap();

    let s = Runner::new(Arc::new(engine), policy(2, 5, None))
        .run_suite(&registry)
        .await;
    assert_eq!(s.results[0].status, EvalStatus::Error);
    assert_eq!(s.results[0].error.as_deref(), Some("engine call timed out after 5s"));
    assert_eq!(s.results[1].status, EvalStatus::Pass);
}

#[tokio::test]
async fn panicking_case_does_not_poison_the_batch() {
    let engine = ScriptedEngine::new()
        .answer("before", ok("SELECT 1"))
        .panic_on("explodes")
        .answer("after", ok("SELECT 2"));
    let registry = Registry::from_cases(vec![
        TestCase::functional("before"),
        TestCase::functional("explodes").named("crashy"),
        TestCase::functional("after"),
    ])
    .unwrap();

    let s = Runner::new(Arc::new(engine), policy(2, 30, None))
        .run_suite(&registry)
        .await;
    assert_eq!(s.total, 3);
    assert_eq!(s.results[0].status, EvalStatus::Pass);
    assert_eq!(s.results[1].status, EvalStatus::Error);
    assert_eq!(s.results[1].name.as_deref(), Some("crashy"));
    assert!(s.results[1].error.as_deref().unwrap().starts_with("case task failed"));
    assert_eq!(s.results[2].status, EvalStatus::Pass);
}

#[tokio::test(start_paused = true)]
async fn deadline_synthesizes_errors_for_unfinished_cases() {
    let engine = ScriptedEngine::new()
        .answer("first", ok("SELECT 1"))
        .delay("first", Duration::from_secs(2))
        .answer("second", ok("SELECT 2"))
        .delay("second", Duration::from_secs(10))
        .answer("third", ok("SELECT 3"));
    let registry = Registry::from_cases(vec![
        TestCase::functional("first"),
        TestCase::functional("second"),
        TestCase::functional("third"),
    ])
    .unwrap();

    let s = Runner::new(Arc::new(engine), policy(1, 30, Some(5)))
        .run_suite(&registry)
        .await;
    assert_eq!(s.total, 3);
    assert_eq!(s.results[0].status, EvalStatus::Pass);
    assert_eq!(
        s.results[1].error.as_deref(),
        Some("harness deadline reached before this case completed")
    );
    assert_eq!(
        s.results[2].error.as_deref(),
        Some("harness deadline reached before this case was dispatched")
    );
    assert_eq!((s.passed, s.failed), (1, 2));
}

/// Tracks how many submissions are in flight at once.
#[derive(Default)]
struct GaugeEngine {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl QueryEngine for GaugeEngine {
    async fn submit(&self, _question: &str) -> Outcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        ok("SELECT 1")
    }

    fn engine_name(&self) -> &'static str {
        "gauge"
    }
}

#[tokio::test(start_paused = true)]
async fn worker_limit_bounds_concurrency() {
    let engine = Arc::new(GaugeEngine::default());
    let cases = (0..10).map(|i| TestCase::functional(format!("q{}", i))).collect();
    let registry = Registry::from_cases(cases).unwrap();

    let s = Runner::new(engine.clone(), policy(3, 30, None))
        .run_suite(&registry)
        .await;
    assert_eq!(s.passed, 10);
    let peak = engine.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {} exceeded limit", peak);
    assert!(peak >= 2, "cases never overlapped (peak {})", peak);
}

#[tokio::test]
async fn unrepresentable_deadline_means_no_deadline() {
    let engine = ScriptedEngine::new().answer("q", ok("SELECT 1"));
    let registry = Registry::from_cases(vec![TestCase::functional("q")]).unwrap();
    let overrides = sqlgate_core::model::Settings {
        deadline_seconds: Some(u64::MAX),
        timeout_seconds: Some(u64::MAX),
        ..Default::default()
    };
    let policy = RunPolicy::resolve(&Default::default(), &overrides);

    let s = Runner::new(Arc::new(engine), policy).run_suite(&registry).await;
    assert_eq!(s.total, 1);
    assert_eq!(s.results[0].status, EvalStatus::Pass);
}
