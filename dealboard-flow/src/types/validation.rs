//! Validation rule types

use super::condition::Condition;
use super::gate::OriginGate;
use super::ids::{ColumnId, ValidationId};
use super::task::DocumentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of active validations per column
pub const MAX_ACTIVE_VALIDATIONS: usize = 3;

/// What a failing validation does to the move
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// The move is refused
    Block,
    /// The move proceeds; the failure is surfaced as a warning
    Warn,
    /// The move proceeds; the task is flagged incomplete
    MarkIncomplete,
}

/// The per-type rule configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationRule {
    /// The named task field must be non-empty
    RequiredField { field: String },
    /// Every item of the referenced checklist must be done
    RequiredChecklist { checklist_id: String },
    /// At least one linked document of the type (and status, if set) must exist
    RequiredDocument {
        document_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        document_status: Option<DocumentStatus>,
    },
    /// The task must link an entity of the given kind
    RequiredRelationship { relationship_type: String },
    /// A type-checked comparison against a task field
    CustomCondition { condition: Condition },
}

impl ValidationRule {
    /// The wire name of this rule type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequiredField { .. } => "required_field",
            Self::RequiredChecklist { .. } => "required_checklist",
            Self::RequiredDocument { .. } => "required_document",
            Self::RequiredRelationship { .. } => "required_relationship",
            Self::CustomCondition { .. } => "custom_condition",
        }
    }

    /// The task field this rule inspects, when it names one
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::RequiredField { field } => Some(field),
            Self::CustomCondition { condition } => Some(&condition.field),
            _ => None,
        }
    }

    /// Semantic duplicate detection within one column.
    ///
    /// Two rules of the same type are duplicates when their discriminating
    /// configuration matches; the condition's declared value type is not
    /// discriminating.
    pub fn duplicates(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::RequiredField { field: a }, Self::RequiredField { field: b }) => a == b,
            (
                Self::RequiredChecklist { checklist_id: a },
                Self::RequiredChecklist { checklist_id: b },
            ) => a == b,
            (
                Self::RequiredDocument { document_type: at, document_status: as_ },
                Self::RequiredDocument { document_type: bt, document_status: bs },
            ) => at == bt && as_ == bs,
            (
                Self::RequiredRelationship { relationship_type: a },
                Self::RequiredRelationship { relationship_type: b },
            ) => a == b,
            (Self::CustomCondition { condition: a }, Self::CustomCondition { condition: b }) => {
                a.field == b.field && a.operator == b.operator && a.value == b.value
            }
            _ => false,
        }
    }
}

/// A validation attached to a column, blocking or warning on entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub id: ValidationId,
    pub column_id: ColumnId,
    #[serde(flatten)]
    pub rule: ValidationRule,
    pub behavior: Behavior,
    /// User-facing explanation shown when the rule fails; never empty
    pub message: String,
    #[serde(flatten)]
    pub gate: OriginGate,
    pub order: usize,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of evaluating one validation against a candidate move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub validation_id: ValidationId,
    pub validation_type: String,
    pub passed: bool,
    pub behavior: Behavior,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// The full evaluation of a candidate move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
    pub blocked: bool,
}

impl ValidationReport {
    /// Results that failed, in evaluation order
    pub fn failed(&self) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Messages of failing non-blocking rules
    pub fn warnings(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.passed && !matches!(r.behavior, Behavior::Block))
            .map(|r| r.message.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::condition::{Operator, ValueType};

    #[test]
    fn test_duplicate_detection_required_field() {
        let a = ValidationRule::RequiredField { field: "assigned_to".into() };
        let b = ValidationRule::RequiredField { field: "assigned_to".into() };
        let c = ValidationRule::RequiredField { field: "price".into() };

        assert!(a.duplicates(&b));
        assert!(!a.duplicates(&c));
    }

    #[test]
    fn test_duplicate_detection_document_includes_status() {
        let signed = ValidationRule::RequiredDocument {
            document_type: "contrato".into(),
            document_status: Some(DocumentStatus::Signed),
        };
        let any = ValidationRule::RequiredDocument {
            document_type: "contrato".into(),
            document_status: None,
        };

        assert!(!signed.duplicates(&any));
        assert!(signed.duplicates(&signed.clone()));
    }

    #[test]
    fn test_duplicate_detection_condition_ignores_value_type() {
        let a = ValidationRule::CustomCondition {
            condition: Condition::new(
                "price",
                Operator::GreaterThan,
                serde_json::json!(100000),
                ValueType::Number,
            ),
        };
        let b = ValidationRule::CustomCondition {
            condition: Condition::new(
                "price",
                Operator::GreaterThan,
                serde_json::json!(100000),
                ValueType::Number,
            ),
        };
        let c = ValidationRule::CustomCondition {
            condition: Condition::new(
                "price",
                Operator::LessThan,
                serde_json::json!(100000),
                ValueType::Number,
            ),
        };

        assert!(a.duplicates(&b));
        assert!(!a.duplicates(&c));
    }

    #[test]
    fn test_cross_type_never_duplicates() {
        let a = ValidationRule::RequiredField { field: "x".into() };
        let b = ValidationRule::RequiredRelationship { relationship_type: "x".into() };
        assert!(!a.duplicates(&b));
    }

    #[test]
    fn test_validation_serde_flattens_rule() {
        let validation = Validation {
            id: ValidationId::new(),
            column_id: ColumnId::from_string("proposta"),
            rule: ValidationRule::RequiredField { field: "client".into() },
            behavior: Behavior::Block,
            message: "Vincule um cliente antes de avançar".into(),
            gate: OriginGate::open(),
            order: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&validation).unwrap();
        assert_eq!(json["type"], "required_field");
        assert_eq!(json["field"], "client");
        assert_eq!(json["behavior"], "block");

        let back: Validation = serde_json::from_value(json).unwrap();
        assert!(back.rule.duplicates(&validation.rule));
    }
}
