//! Error taxonomies for the pipeline.
//!
//! Per the error-handling design, these are *collected*, not thrown: both
//! variants end up in [`crate::build::BuildResult::errors`] rather than
//! aborting the call that produced them. A caller inspects `errors` before
//! trusting `outputs`.

use std::fmt;

/// A per-file parse/load failure encountered during discovery.
///
/// Never aborts the pipeline: discovery records one of these and moves on
/// to the next file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{file}: {message}")]
pub struct DiscoveryError {
    pub file: String,
    pub message: String,
    /// Underlying cause, if this wraps a lower-level failure (e.g. a parse
    /// error from swc). Kept as a string since callers only ever display or
    /// log it — turning it back into a typed error has no consumer.
    pub cause: Option<String>,
}

impl DiscoveryError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(file: impl Into<String>, message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }
}

/// A structural violation detected by the build driver: a dependency cycle,
/// an illegal nested-stack recursion, or inconsistent entity data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct BuildError {
    pub entity_name: Option<String>,
    pub message: String,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            entity_name: None,
            message: message.into(),
        }
    }

    pub fn for_entity(entity_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity_name: Some(entity_name.into()),
            message: message.into(),
        }
    }

    /// Build the "Circular dependency" error for a detected cycle, per
    /// invariant 3 in §8: the message contains "Circular dependency" and
    /// `entity_name` is one of the nodes on the cycle.
    pub fn circular_dependency(cycle: &[String]) -> Self {
        let path = cycle.join(" -> ");
        Self {
            entity_name: cycle.first().cloned(),
            message: format!("Circular dependency detected: {path}"),
        }
    }

    /// Build the "Circular nested stack" error for §4.3 step 3 / invariant 7.
    pub fn circular_nested_stack(path: &std::path::Path) -> Self {
        Self {
            entity_name: None,
            message: format!("Circular nested stack detected at {}", path.display()),
        }
    }
}

/// The union of failures a [`crate::build::BuildResult`] accumulates:
/// discovery failures from any level of the project/child-project
/// recursion, plus build-level structural violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_dependency_message_contains_marker() {
        let err = BuildError::circular_dependency(&["a".into(), "b".into(), "a".into()]);
        assert!(err.message.contains("Circular dependency"));
        assert_eq!(err.entity_name.as_deref(), Some("a"));
    }

    #[test]
    fn circular_nested_stack_message_contains_marker() {
        let err = BuildError::circular_nested_stack(std::path::Path::new("/proj/child"));
        assert!(err.message.contains("Circular nested stack"));
    }
}
