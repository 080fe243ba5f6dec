//! Validation rule commands and evaluation

mod add;
mod delete;
mod evaluate;
mod get;
mod list;
mod reorder;
mod update;

pub use add::AddValidation;
pub use delete::DeleteValidation;
pub use evaluate::evaluate_validations;
pub use get::GetValidation;
pub use list::ListValidations;
pub use reorder::ReorderValidations;
pub use update::UpdateValidation;

use crate::condition::{normalize, operand_type};
use crate::error::{FlowError, Result};
use crate::types::{Condition, ValidationRule};
use serde_json::Value;

/// Check a rule configuration and return it with its condition value
/// normalized for storage.
///
/// Rejected configurations persist nothing; the same checks run on create
/// and on full-replace update.
pub(crate) fn checked_rule(rule: ValidationRule, message: &str) -> Result<ValidationRule> {
    if message.trim().is_empty() {
        return Err(FlowError::MissingMessage);
    }

    match rule {
        ValidationRule::CustomCondition { condition } => Ok(ValidationRule::CustomCondition {
            condition: checked_condition(condition)?,
        }),
        ValidationRule::RequiredDocument { document_status: Some(status), .. }
            if !status.is_satisfied() =>
        {
            Err(FlowError::invalid_value(
                "document_status",
                "only signed or approved documents can be required",
            ))
        }
        other => Ok(other),
    }
}

/// Type-check a condition's operator and normalize its operand
pub(crate) fn checked_condition(mut condition: Condition) -> Result<Condition> {
    if !condition.operator.allowed_for(condition.value_type) {
        return Err(FlowError::OperatorMismatch {
            operator: condition.operator.wire_name().into(),
            value_type: condition.value_type.wire_name().into(),
        });
    }

    if !condition.operator.requires_operand() {
        condition.value = Value::Null;
        return Ok(condition);
    }

    if condition.value.is_null() {
        return Err(FlowError::invalid_value(
            &condition.field,
            format!("operator '{}' needs a value", condition.operator.wire_name()),
        ));
    }

    let expected_type = operand_type(condition.operator, condition.value_type);
    let normalized = normalize(expected_type, &condition.value).ok_or_else(|| {
        FlowError::invalid_value(
            &condition.field,
            format!("value does not normalize to {}", expected_type.wire_name()),
        )
    })?;
    condition.value = normalized;

    Ok(condition)
}
