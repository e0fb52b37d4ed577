//! Invocation tracing core.
//!
//! The [`Tracer`] reacts to entry/exit/throw notifications delivered by an
//! instrumentation source, synchronously on the instrumented thread:
//!
//! ```text
//! before            -> open frame, depth += 1, start watch
//! after_returning   -> close frame with cost, build Advice::Returned
//! after_throwing    -> synthetic throw child + close frame, Advice::Thrown
//!                      |
//!                      v  (depth back to 0)
//! finalize          -> first-level exempt OR condition holds?
//!                        counter >= limit  -> abort session
//!                        else              -> write tree, count emission
//!                      context discarded on every path
//! ```
//!
//! Per-thread state is never shared; the only cross-thread state is the
//! session's emission counter and its terminal flag. Two threads finishing
//! at the same instant may both pass the limit check before either counts
//! its emission, so the limit can be overshot slightly; the check is
//! deliberately not a compare-and-swap gate.

pub mod context;
pub mod watch;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::advice::{Advice, MethodIdentity, ThrownError};
use crate::condition::ConditionEvaluator;
use crate::config::TraceConfig;
use crate::matcher::{FirstLevelMatcher, TargetMatcher};
use crate::session::TraceSession;
use crate::tree::FrameKind;
use crate::Result;

use context::{ContextMap, TraceContext};

/// Callback surface the instrumentation source drives.
///
/// The source guarantees entry/exit pairing per thread: every exit follows
/// a matching entry on the same thread before any sibling entry at the
/// same depth. None of the handlers fail; tracing problems are reported
/// through the session, never back to the source.
pub trait AdviceListener {
    /// A method was entered.
    fn before(&self, identity: &MethodIdentity, params: &[Value]);

    /// A method returned normally.
    fn after_returning(&self, identity: &MethodIdentity, params: &[Value], return_value: Value);

    /// A method was terminated by a thrown error.
    fn after_throwing(&self, identity: &MethodIdentity, params: &[Value], error: ThrownError);

    /// Clear residual per-thread state when tracing is torn down
    /// externally.
    fn shutdown(&self) {}
}

/// Assembles per-thread call trees and emits them through the session.
pub struct Tracer {
    config: TraceConfig,
    session: Arc<dyn TraceSession>,
    evaluator: Box<dyn ConditionEvaluator>,
    matcher: Box<dyn FirstLevelMatcher>,
    contexts: ContextMap,
}

impl Tracer {
    pub fn new(
        config: TraceConfig,
        session: Arc<dyn TraceSession>,
        evaluator: Box<dyn ConditionEvaluator>,
        matcher: Box<dyn FirstLevelMatcher>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            session,
            evaluator,
            matcher,
            contexts: ContextMap::new(),
        })
    }

    /// Build the first-level matcher from the config's target patterns.
    pub fn from_config(
        config: TraceConfig,
        session: Arc<dyn TraceSession>,
        evaluator: Box<dyn ConditionEvaluator>,
    ) -> Result<Self> {
        let matcher = TargetMatcher::from_targets(&config.first_level)?;
        Self::new(config, session, evaluator, Box::new(matcher))
    }

    /// Whether the calling thread has an in-progress trace.
    pub fn has_active_trace(&self) -> bool {
        self.contexts.contains_current()
    }

    /// Number of threads with in-progress traces.
    pub fn active_trace_count(&self) -> usize {
        self.contexts.len()
    }

    /// Close the current frame, then finalize if the outermost frame just
    /// completed.
    fn finish_frame(&self, advice: Advice, close: impl FnOnce(&mut TraceContext) -> f64) {
        let (cost_ms, finished) = self.contexts.with_current(|ctx| {
            let cost_ms = close(ctx);
            ctx.depth = ctx.depth.saturating_sub(1);
            (cost_ms, ctx.depth == 0)
        });
        if finished {
            // Ownership moves out of the registry here, so the context is
            // dropped on every path out of the finalizer.
            if let Some(ctx) = self.contexts.take_current() {
                self.finalize(ctx, &advice, cost_ms);
            }
        }
    }

    fn finalize(&self, ctx: TraceContext, advice: &Advice, cost_ms: f64) {
        if ctx.tree.root_label().is_none() {
            return;
        }
        if self.session.is_terminated() {
            return;
        }
        if let Err(e) = self.emit_if_triggered(&ctx, advice, cost_ms) {
            let condition = self.config.condition_expression().unwrap_or_default();
            warn!(error = %e, condition, "trace finalization failed");
            self.session
                .fail(&format!("trace failed, condition is: {condition}, {e}"));
        }
    }

    fn emit_if_triggered(&self, ctx: &TraceContext, advice: &Advice, cost_ms: f64) -> Result<()> {
        if !self.should_emit(ctx, advice, cost_ms)? {
            return Ok(());
        }
        if self.session.emission_count() >= self.config.emit_limit {
            debug!(
                limit = self.config.emit_limit,
                "emission limit reached, aborting session"
            );
            self.session.abort(self.config.emit_limit);
        } else {
            self.session.write(&ctx.tree)?;
            let total = self.session.record_emission();
            debug!(total, trace_id = ctx.tree.trace_id(), "trace emitted");
        }
        Ok(())
    }

    /// First-level roots bypass the condition; an absent condition holds
    /// trivially.
    fn should_emit(&self, ctx: &TraceContext, advice: &Advice, cost_ms: f64) -> Result<bool> {
        if self.root_is_first_level(ctx) {
            return Ok(true);
        }
        match self.config.condition_expression() {
            Some(expression) => self.evaluator.evaluate(expression, advice, cost_ms),
            None => Ok(true),
        }
    }

    /// Root labels that do not parse as `Type:method()` are never
    /// first-level.
    fn root_is_first_level(&self, ctx: &TraceContext) -> bool {
        ctx.tree
            .root_label()
            .and_then(MethodIdentity::parse_label)
            .map(|id| self.matcher.is_first_level(&id.class_name, &id.method_name))
            .unwrap_or(false)
    }
}

impl AdviceListener for Tracer {
    fn before(&self, identity: &MethodIdentity, _params: &[Value]) {
        self.contexts.with_current(|ctx| {
            ctx.tree.begin(identity.frame_label(), FrameKind::Invoke);
            ctx.depth += 1;
            ctx.watch.start();
        });
    }

    fn after_returning(&self, identity: &MethodIdentity, params: &[Value], return_value: Value) {
        let advice = Advice::for_return(identity.clone(), params.to_vec(), return_value);
        self.finish_frame(advice, |ctx| {
            let cost_ms = ctx.watch.cost_in_millis();
            ctx.tree.end_with_cost(cost_ms);
            cost_ms
        });
    }

    fn after_throwing(&self, identity: &MethodIdentity, params: &[Value], error: ThrownError) {
        let throw_label = format!("throw:{}()", error.type_name);
        let advice = Advice::for_throw(identity.clone(), params.to_vec(), error);
        self.finish_frame(advice, |ctx| {
            ctx.tree.begin(throw_label, FrameKind::Throw).end();
            let cost_ms = ctx.watch.cost_in_millis();
            ctx.tree.end_with_cost(cost_ms);
            cost_ms
        });
    }

    fn shutdown(&self) {
        self.contexts.clear();
    }
}
