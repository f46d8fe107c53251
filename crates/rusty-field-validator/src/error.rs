// File: src/error.rs
// Purpose: Error types for rule compilation and evaluation

use std::sync::Arc;

/// Errors produced while building or running validation rules
///
/// Cloneable so a single pending result can hand the same failure to every
/// caller awaiting it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidatorError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Validation rule failed: {0}")]
    RuleFailed(Arc<anyhow::Error>),

    #[error("Invalid validator configuration: {0}")]
    Config(String),

    #[error("No Tokio runtime available to run validation")]
    NoRuntime,
}

impl ValidatorError {
    /// Wrap any rule failure
    pub fn rule_failed(err: impl Into<anyhow::Error>) -> Self {
        Self::RuleFailed(Arc::new(err.into()))
    }
}

pub type Result<T> = std::result::Result<T, ValidatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_failed_message() {
        let err = ValidatorError::rule_failed(anyhow::anyhow!("server unreachable"));
        assert_eq!(err.to_string(), "Validation rule failed: server unreachable");
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = ValidatorError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid pattern '('"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
