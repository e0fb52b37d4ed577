//! Shared helpers for integration tests.

use std::sync::Arc;

use calltrace::advice::Advice;
use calltrace::condition::ConditionEvaluator;
use calltrace::matcher::FirstLevelMatcher;
use calltrace::session::MemorySession;
use calltrace::{CalltraceError, TraceConfig, Tracer};

/// Route tracer logs through the test harness when a test opts in.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Evaluator understanding only the literal expressions "true" and
/// "false"; anything else is an evaluation error.
pub fn literal_evaluator() -> Box<dyn ConditionEvaluator> {
    Box::new(
        |expression: &str, _advice: &Advice, _cost_ms: f64| match expression {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(CalltraceError::Condition(format!(
                "unsupported expression: {other}"
            ))),
        },
    )
}

#[allow(dead_code)]
pub fn no_first_level() -> Box<dyn FirstLevelMatcher> {
    Box::new(|_: &str, _: &str| false)
}

#[allow(dead_code)]
pub fn memory_tracer(config: TraceConfig) -> (Arc<Tracer>, Arc<MemorySession>) {
    let session = Arc::new(MemorySession::new());
    let tracer = Tracer::new(
        config,
        session.clone(),
        literal_evaluator(),
        no_first_level(),
    )
    .expect("tracer construction");
    (Arc::new(tracer), session)
}
