//! Per-thread elapsed-time measurement.

use std::time::Instant;

/// Stack of start instants matched LIFO against frame exits.
///
/// One watch lives inside each thread's trace context, so starts and reads
/// are always paired on the owning thread.
#[derive(Debug, Default)]
pub struct InvokeWatch {
    starts: Vec<Instant>,
}

impl InvokeWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing the frame that is about to open.
    pub fn start(&mut self) {
        self.starts.push(Instant::now());
    }

    /// Elapsed fractional milliseconds for the innermost started frame,
    /// read exactly once. An unmatched read yields 0.0; entry/exit pairing
    /// is the instrumentation source's contract.
    pub fn cost_in_millis(&mut self) -> f64 {
        self.starts
            .pop()
            .map(|start| start.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    pub fn is_idle(&self) -> bool {
        self.starts.is_empty()
    }
}
