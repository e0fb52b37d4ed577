//! Boundary to the condition-expression engine.

use crate::advice::Advice;
use crate::Result;

/// Evaluates a boolean trigger expression against a completed call.
///
/// The expression language is supplied by the embedder; the tracer only
/// needs a yes/no answer. An evaluation error is reported to the consumer
/// and terminates the tracing session.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, advice: &Advice, cost_ms: f64) -> Result<bool>;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&str, &Advice, f64) -> Result<bool> + Send + Sync,
{
    fn evaluate(&self, expression: &str, advice: &Advice, cost_ms: f64) -> Result<bool> {
        self(expression, advice, cost_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::MethodIdentity;
    use crate::CalltraceError;
    use serde_json::json;

    fn sample_advice() -> Advice {
        Advice::for_return(MethodIdentity::new("Calc", "add"), vec![json!(1)], json!(2))
    }

    #[test]
    fn test_closure_evaluator() {
        let evaluator =
            |expression: &str, _advice: &Advice, _cost_ms: f64| -> Result<bool> {
                Ok(expression == "yes")
            };

        assert!(evaluator.evaluate("yes", &sample_advice(), 1.0).unwrap());
        assert!(!evaluator.evaluate("no", &sample_advice(), 1.0).unwrap());
    }

    #[test]
    fn test_evaluator_error_passes_through() {
        let evaluator = |expression: &str, _advice: &Advice, _cost_ms: f64| -> Result<bool> {
            Err(CalltraceError::Condition(format!(
                "cannot parse '{expression}'"
            )))
        };

        let err = evaluator.evaluate("1 +", &sample_advice(), 1.0).unwrap_err();
        assert!(err.to_string().contains("cannot parse"));
    }
}
