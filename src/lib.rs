//! Per-thread method-invocation tracing.
//!
//! An external instrumentation layer delivers entry, exit, and throw
//! notifications for method calls; this crate assembles them into a nested
//! call tree per top-level invocation on each thread, times every frame,
//! and decides exactly once per top-level call whether the completed tree
//! is emitted to the consumer session, skipped, or whether tracing is
//! aborted because the global emission limit was reached.

pub mod advice;
pub mod condition;
pub mod config;
pub mod error;
pub mod matcher;
pub mod session;
pub mod tracer;
pub mod tree;

pub use config::TraceConfig;
pub use error::{CalltraceError, Result};
pub use tracer::{AdviceListener, Tracer};
