//! Per-thread trace state and its registry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use super::watch::InvokeWatch;
use crate::tree::CallTree;

/// The in-progress trace of one thread's top-level invocation.
///
/// Created lazily on the first entry notification, discarded
/// unconditionally once the nesting depth returns to zero. `depth` equals
/// the number of currently open tree frames on the owning thread.
#[derive(Debug)]
pub struct TraceContext {
    pub tree: CallTree,
    pub depth: usize,
    pub watch: InvokeWatch,
}

impl TraceContext {
    fn new() -> Self {
        Self {
            tree: CallTree::new(),
            depth: 0,
            watch: InvokeWatch::new(),
        }
    }
}

/// Registry of per-thread contexts, owned by the tracer.
///
/// Each thread only ever touches its own entry; the mutex guards map
/// structure, not trace data. Poisoned locks are recovered so the
/// instrumentation handlers can never panic on the registry.
#[derive(Debug, Default)]
pub(crate) struct ContextMap {
    inner: Mutex<HashMap<ThreadId, TraceContext>>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on the calling thread's context, creating it if absent.
    pub fn with_current<R>(&self, f: impl FnOnce(&mut TraceContext) -> R) -> R {
        let mut map = self.lock();
        let ctx = map
            .entry(thread::current().id())
            .or_insert_with(TraceContext::new);
        f(ctx)
    }

    /// Remove and return the calling thread's context. Removing a missing
    /// context is a no-op returning `None`.
    pub fn take_current(&self) -> Option<TraceContext> {
        self.lock().remove(&thread::current().id())
    }

    pub fn contains_current(&self) -> bool {
        self.lock().contains_key(&thread::current().id())
    }

    /// Drop residual contexts for every thread.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadId, TraceContext>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
