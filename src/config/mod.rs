//! Trace trigger configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::matcher::TargetMatcher;
use crate::{CalltraceError, Result};

/// A first-level invocation target.
///
/// Both fields are regex patterns matched anchored against the class and
/// method name of a trace's root call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub class: String,
    pub method: String,
}

/// Settings governing when a completed trace is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Boolean expression evaluated against each completed top-level call.
    /// Absent or empty means every completed trace qualifies.
    #[serde(default)]
    pub condition: Option<String>,

    /// Emissions allowed before the session is aborted.
    #[serde(default = "default_emit_limit")]
    pub emit_limit: usize,

    /// Targets whose top-level calls bypass the condition check.
    #[serde(default)]
    pub first_level: Vec<TargetSpec>,
}

fn default_emit_limit() -> usize {
    100
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            condition: None,
            emit_limit: default_emit_limit(),
            first_level: Vec::new(),
        }
    }
}

impl TraceConfig {
    pub fn with_condition(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            ..Self::default()
        }
    }

    /// The configured condition, with empty strings treated as absent.
    pub fn condition_expression(&self) -> Option<&str> {
        self.condition
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: TraceConfig = serde_yaml_ng::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CalltraceError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: TraceConfig = serde_yaml_ng::from_str(&contents).map_err(|e| {
            CalltraceError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the limit and compile-check the target patterns.
    pub fn validate(&self) -> Result<()> {
        if self.emit_limit == 0 {
            return Err(CalltraceError::Config(
                "emit_limit must be at least 1".to_string(),
            ));
        }
        TargetMatcher::from_targets(&self.first_level)?;
        Ok(())
    }
}
