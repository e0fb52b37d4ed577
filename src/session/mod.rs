//! Consumer session: emission sink, shared counter, and terminal signals.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::tree::CallTree;
use crate::Result;

pub mod file;

pub use file::FileSession;

/// The consumer side of the tracer.
///
/// Receives completed call trees and failure messages, owns the emission
/// counter shared by every instrumented thread, and carries the one-way
/// terminal flag. All methods take `&self` and must be callable from any
/// thread.
pub trait TraceSession: Send + Sync {
    /// Deliver one completed call tree.
    fn write(&self, tree: &CallTree) -> Result<()>;

    /// Trees emitted so far.
    fn emission_count(&self) -> usize;

    /// Record one successful emission; returns the updated count.
    fn record_emission(&self) -> usize;

    /// Signal that the emission limit was reached. Terminal: no further
    /// writes will be attempted by any thread.
    fn abort(&self, limit: usize);

    /// Report a failure message and terminate the session.
    fn fail(&self, message: &str);

    /// Whether the session has been aborted or failed.
    fn is_terminated(&self) -> bool;
}

/// In-memory session for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySession {
    emitted: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
    emissions: AtomicUsize,
    terminated: AtomicBool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered trees delivered so far.
    pub fn emitted(&self) -> Vec<String> {
        lock_recovered(&self.emitted).clone()
    }

    /// Abort and failure messages delivered so far.
    pub fn messages(&self) -> Vec<String> {
        lock_recovered(&self.messages).clone()
    }
}

impl TraceSession for MemorySession {
    fn write(&self, tree: &CallTree) -> Result<()> {
        lock_recovered(&self.emitted).push(tree.render());
        Ok(())
    }

    fn emission_count(&self) -> usize {
        self.emissions.load(Ordering::SeqCst)
    }

    fn record_emission(&self) -> usize {
        self.emissions.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn abort(&self, limit: usize) {
        lock_recovered(&self.messages).push(format!(
            "Emission limit of {limit} reached, tracing aborted"
        ));
        self.terminated.store(true, Ordering::SeqCst);
    }

    fn fail(&self, message: &str) {
        lock_recovered(&self.messages).push(message.to_string());
        self.terminated.store(true, Ordering::SeqCst);
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// Lock with poisoning recovered; session state stays usable after a
/// panicked writer.
pub(crate) fn lock_recovered<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
