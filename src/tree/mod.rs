//! Call-tree assembly and rendering.
//!
//! A [`CallTree`] collects the frames of one top-level invocation on one
//! thread. Frames open on method entry and close on the matching exit,
//! following the strict pairing the instrumentation source guarantees:
//!
//! ```text
//! ===== Trace [2026-08-05 14:03:21.418] [0198...] =====
//! `---[12.305ms] com.demo.Orders:submit()
//!     +---[8.112ms] com.demo.Inventory:reserve()
//!     |   `---throw:StockError()
//!     `---[1.004ms] com.demo.Audit:record()
//! ```
//!
//! Each tree carries a time-ordered trace id and its UTC start time, used
//! in the rendered header and by file-backed sinks for naming.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How a frame was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameKind {
    /// Regular frame opened on method entry.
    Invoke,
    /// Synthetic frame recording a thrown error, closed immediately.
    Throw,
}

/// A single frame in the call tree.
///
/// `children` holds indices into the owning tree's frame arena.
#[derive(Debug, Clone, Serialize)]
pub struct FrameNode {
    pub label: String,
    pub kind: FrameKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_ms: Option<f64>,
    pub children: Vec<usize>,
}

impl FrameNode {
    fn new(label: String, kind: FrameKind) -> Self {
        Self {
            label,
            kind,
            cost_ms: None,
            children: Vec::new(),
        }
    }
}

/// Nested frames of one top-level invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CallTree {
    nodes: Vec<FrameNode>,
    #[serde(skip)]
    open: Vec<usize>,
    trace_id: String,
    started_at: DateTime<Utc>,
}

impl CallTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            open: Vec::new(),
            trace_id: Uuid::now_v7().to_string(),
            started_at: Utc::now(),
        }
    }

    /// Open a frame under the current open frame, or as the tree root.
    pub fn begin(&mut self, label: impl Into<String>, kind: FrameKind) -> &mut Self {
        let idx = self.nodes.len();
        self.nodes.push(FrameNode::new(label.into(), kind));
        if let Some(&parent) = self.open.last() {
            if let Some(parent) = self.nodes.get_mut(parent) {
                parent.children.push(idx);
            }
        }
        self.open.push(idx);
        self
    }

    /// Close the innermost open frame without recording a cost.
    ///
    /// Closing with nothing open is a no-op; entry/exit pairing is the
    /// caller's contract.
    pub fn end(&mut self) -> &mut Self {
        self.open.pop();
        self
    }

    /// Close the innermost open frame, recording its elapsed cost.
    pub fn end_with_cost(&mut self, cost_ms: f64) -> &mut Self {
        if let Some(idx) = self.open.pop() {
            if let Some(node) = self.nodes.get_mut(idx) {
                node.cost_ms = Some(cost_ms);
            }
        }
        self
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn root(&self) -> Option<&FrameNode> {
        self.nodes.first()
    }

    pub fn root_label(&self) -> Option<&str> {
        self.root().map(|node| node.label.as_str())
    }

    pub fn frame(&self, idx: usize) -> Option<&FrameNode> {
        self.nodes.get(idx)
    }

    pub fn frame_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of currently open frames.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Human-readable nested rendering with per-frame cost markers.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "===== Trace [{}] [{}] =====\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.trace_id
        ));
        if !self.nodes.is_empty() {
            self.render_frame(0, "", true, &mut out);
        }
        out
    }

    fn render_frame(&self, idx: usize, prefix: &str, is_last: bool, out: &mut String) {
        let Some(node) = self.nodes.get(idx) else {
            return;
        };
        let branch = if is_last { "`---" } else { "+---" };
        let cost = node
            .cost_ms
            .map(|c| format!("[{c:.3}ms] "))
            .unwrap_or_default();
        out.push_str(&format!("{prefix}{branch}{cost}{}\n", node.label));

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "|   " });
        for (i, &child) in node.children.iter().enumerate() {
            self.render_frame(child, &child_prefix, i + 1 == node.children.len(), out);
        }
    }
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}
