//! First-level invocation matching.

use regex::Regex;

use crate::config::TargetSpec;
use crate::{CalltraceError, Result};

/// Decides whether a `(class, method)` pair names a first-level target,
/// exempt from the condition check at finalization.
pub trait FirstLevelMatcher: Send + Sync {
    fn is_first_level(&self, class_name: &str, method_name: &str) -> bool;
}

impl<F> FirstLevelMatcher for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn is_first_level(&self, class_name: &str, method_name: &str) -> bool {
        self(class_name, method_name)
    }
}

/// Regex matcher compiled from configured target specs.
#[derive(Debug)]
pub struct TargetMatcher {
    targets: Vec<(Regex, Regex)>,
}

impl TargetMatcher {
    /// Matcher that matches nothing.
    pub fn empty() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    /// Compile the configured patterns. Patterns are anchored, so `Foo`
    /// matches exactly `Foo` and not `FooBar`.
    pub fn from_targets(specs: &[TargetSpec]) -> Result<Self> {
        let mut targets = Vec::with_capacity(specs.len());
        for spec in specs {
            targets.push((
                Self::compile_anchored(&spec.class)?,
                Self::compile_anchored(&spec.method)?,
            ));
        }
        Ok(Self { targets })
    }

    fn compile_anchored(pattern: &str) -> Result<Regex> {
        Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            CalltraceError::Config(format!("Invalid target pattern '{pattern}': {e}"))
        })
    }
}

impl FirstLevelMatcher for TargetMatcher {
    fn is_first_level(&self, class_name: &str, method_name: &str) -> bool {
        self.targets
            .iter()
            .any(|(class, method)| class.is_match(class_name) && method.is_match(method_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(class: &str, method: &str) -> TargetSpec {
        TargetSpec {
            class: class.to_string(),
            method: method.to_string(),
        }
    }

    #[test]
    fn test_exact_match() {
        let matcher = TargetMatcher::from_targets(&[spec("com\\.demo\\.Orders", "submit")]).unwrap();
        assert!(matcher.is_first_level("com.demo.Orders", "submit"));
        assert!(!matcher.is_first_level("com.demo.Orders", "cancel"));
        assert!(!matcher.is_first_level("com.demo.Inventory", "submit"));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let matcher = TargetMatcher::from_targets(&[spec("Foo", "run")]).unwrap();
        assert!(matcher.is_first_level("Foo", "run"));
        assert!(!matcher.is_first_level("FooBar", "run"));
        assert!(!matcher.is_first_level("Foo", "running"));
    }

    #[test]
    fn test_wildcard_patterns() {
        let matcher = TargetMatcher::from_targets(&[spec("com\\.demo\\..*", ".*")]).unwrap();
        assert!(matcher.is_first_level("com.demo.Anything", "anyMethod"));
        assert!(!matcher.is_first_level("org.other.Thing", "anyMethod"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = TargetMatcher::from_targets(&[spec("[unclosed", "m")]).unwrap_err();
        assert!(err.to_string().contains("Invalid target pattern"));
    }

    #[test]
    fn test_empty_matcher() {
        assert!(!TargetMatcher::empty().is_first_level("Any", "thing"));
    }

    #[test]
    fn test_closure_matcher() {
        let matcher = |class_name: &str, _method_name: &str| class_name == "Root";
        assert!(matcher.is_first_level("Root", "m"));
        assert!(!matcher.is_first_level("Other", "m"));
    }
}
