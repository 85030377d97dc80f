//! Error types shared across the repository crates.

use thiserror::Error;

use crate::state::SourceState;

/// A metadata document failed structural or semantic validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The document is not a JSON object.
    #[error("metadata document is malformed: {reason}")]
    Malformed { reason: String },

    /// A required tag is absent.
    #[error("'{tag}' tag is missing")]
    MissingTag { tag: String },

    /// A tag has the wrong JSON type.
    #[error("'{tag}' must be {expected}")]
    WrongType { tag: String, expected: &'static str },

    /// A tag has a value or a combination of values that is not allowed.
    #[error("invalid '{tag}': {reason}")]
    InvalidValue { tag: String, reason: String },
}

impl SchemaError {
    pub fn missing(tag: impl Into<String>) -> Self {
        Self::MissingTag { tag: tag.into() }
    }

    pub fn wrong_type(tag: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            tag: tag.into(),
            expected,
        }
    }

    pub fn invalid(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// The tag the error refers to, if any.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Malformed { .. } => None,
            Self::MissingTag { tag }
            | Self::WrongType { tag, .. }
            | Self::InvalidValue { tag, .. } => Some(tag),
        }
    }
}

/// A lifecycle transition was attempted out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("source is {found}, expected {expected}")]
pub struct LifecycleError {
    pub expected: SourceState,
    pub found: SourceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::missing("format");
        assert_eq!(err.to_string(), "'format' tag is missing");

        let err = SchemaError::wrong_type("info", "an object");
        assert_eq!(err.to_string(), "'info' must be an object");
        assert_eq!(err.tag(), Some("info"));
    }

    #[test]
    fn test_lifecycle_error_display() {
        let err = LifecycleError {
            expected: SourceState::LabelMapped,
            found: SourceState::Validated,
        };
        assert_eq!(err.to_string(), "source is validated, expected label-mapped");
    }
}
