//! Error types for the rule engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur in engine operations.
///
/// Expected rule failures are never errors: a failing validation is data in
/// a `ValidationResult`, a failing action is data in an `ActionResult`.
/// These variants cover configuration rejection, missing entities, and I/O.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Validation rule not found
    #[error("validation not found: {id}")]
    ValidationNotFound { id: String },

    /// Action not found
    #[error("action not found: {id}")]
    ActionNotFound { id: String },

    /// Task not found in the external task store
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// Column not found in the external task store
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// A column already carries its maximum number of active validations
    #[error("column '{column_id}' already has {limit} active validations")]
    ValidationLimit { column_id: String, limit: usize },

    /// A semantically identical rule already exists in the column
    #[error("duplicate {rule_type} rule in column '{column_id}'")]
    DuplicateRule { rule_type: String, column_id: String },

    /// The trigger is outside the action type's allowed set
    #[error("trigger '{trigger}' is not allowed for action type '{action_type}'")]
    InvalidTrigger { action_type: String, trigger: String },

    /// The operator is not permitted for the condition's value type
    #[error("operator '{operator}' is not allowed for {value_type} fields")]
    OperatorMismatch { operator: String, value_type: String },

    /// Validation messages are mandatory and non-empty
    #[error("validation message must not be empty")]
    MissingMessage,

    /// A required field mapping resolved to no value
    #[error("required mapping target '{target}' resolved to no value")]
    MissingRequiredField { target: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A collaborator service refused or timed out
    #[error("{service} error: {message}")]
    Collaborator { service: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a collaborator error
    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Configuration errors are rejected synchronously at rule-store write
    /// time; nothing is persisted when one is returned.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ValidationLimit { .. }
                | Self::DuplicateRule { .. }
                | Self::InvalidTrigger { .. }
                | Self::OperatorMismatch { .. }
                | Self::MissingMessage
                | Self::InvalidValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowError::ValidationLimit {
            column_id: "proposta".into(),
            limit: 3,
        };
        assert_eq!(
            err.to_string(),
            "column 'proposta' already has 3 active validations"
        );
    }

    #[test]
    fn test_configuration_classification() {
        assert!(FlowError::MissingMessage.is_configuration());
        assert!(FlowError::DuplicateRule {
            rule_type: "required_field".into(),
            column_id: "c".into()
        }
        .is_configuration());
        assert!(!FlowError::TaskNotFound { id: "t".into() }.is_configuration());
        assert!(!FlowError::collaborator("messenger", "timeout").is_configuration());
    }
}
