//! Completed-call snapshots consumed by condition evaluation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of an instrumented invocation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodIdentity {
    pub class_name: String,
    pub method_name: String,
}

impl MethodIdentity {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Frame label in the form `Type:method()`.
    pub fn frame_label(&self) -> String {
        format!("{}:{}()", self.class_name, self.method_name)
    }

    /// Parse a frame label back into an identity.
    ///
    /// A label without a `:` separator is not an invocation label and
    /// yields `None`.
    pub fn parse_label(label: &str) -> Option<Self> {
        let (class_name, rest) = label.split_once(':')?;
        let method_name = rest.strip_suffix("()").unwrap_or(rest);
        Some(Self::new(class_name, method_name))
    }
}

/// An error thrown by an instrumented call, as reported by the
/// instrumentation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrownError {
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ThrownError {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: None,
        }
    }

    pub fn with_message(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: Some(message.into()),
        }
    }
}

/// How a traced call completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvokeOutcome {
    Returned,
    Thrown,
}

/// Immutable snapshot of one completed invocation.
///
/// Built at frame-exit time from the identity, the arguments, and either
/// the return value or the thrown error; handed to condition evaluation
/// together with the frame's elapsed cost and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    pub identity: MethodIdentity,
    pub params: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thrown: Option<ThrownError>,
    pub outcome: InvokeOutcome,
}

impl Advice {
    /// Snapshot for a call that returned normally.
    pub fn for_return(identity: MethodIdentity, params: Vec<Value>, return_value: Value) -> Self {
        Self {
            identity,
            params,
            return_value: Some(return_value),
            thrown: None,
            outcome: InvokeOutcome::Returned,
        }
    }

    /// Snapshot for a call terminated by a thrown error.
    pub fn for_throw(identity: MethodIdentity, params: Vec<Value>, thrown: ThrownError) -> Self {
        Self {
            identity,
            params,
            return_value: None,
            thrown: Some(thrown),
            outcome: InvokeOutcome::Thrown,
        }
    }

    pub fn is_returned(&self) -> bool {
        self.outcome == InvokeOutcome::Returned
    }

    pub fn is_thrown(&self) -> bool {
        self.outcome == InvokeOutcome::Thrown
    }
}
