//! Validation evaluation against a candidate move

use crate::condition;
use crate::context::FlowContext;
use crate::error::Result;
use crate::types::{
    Behavior, Column, Task, Validation, ValidationReport, ValidationResult, ValidationRule,
};

/// Evaluate the destination column's validations against a candidate move.
///
/// Rules are selected by origin gate (gated rules are skipped entirely when
/// they do not apply) and evaluated in ascending order. Evaluation never
/// short-circuits: every applicable rule runs so the caller can present all
/// failing reasons at once. The report is blocked iff some failing rule
/// has block behavior.
pub async fn evaluate_validations(
    ctx: &FlowContext,
    task: &Task,
    origin: Option<&Column>,
    destination: &Column,
) -> Result<ValidationReport> {
    let validations = ctx.column_validations(&destination.id, false).await?;

    let mut results = Vec::new();
    for validation in &validations {
        if !validation.gate.applies(origin, destination) {
            continue;
        }
        results.push(evaluate_one(validation, task));
    }

    let blocked = results
        .iter()
        .any(|r| !r.passed && matches!(r.behavior, Behavior::Block));

    Ok(ValidationReport { results, blocked })
}

/// Evaluate a single rule against the task snapshot
fn evaluate_one(validation: &Validation, task: &Task) -> ValidationResult {
    let (passed, details) = match &validation.rule {
        ValidationRule::RequiredField { field } => {
            let value = task.field(field);
            let passed = value.as_ref().map(|v| !v.is_empty()).unwrap_or(false);
            (
                passed,
                serde_json::json!({ "field": field, "present": passed }),
            )
        }
        ValidationRule::RequiredChecklist { checklist_id } => match task.find_checklist(checklist_id) {
            Some(checklist) => {
                let done = checklist.items.iter().filter(|i| i.done).count();
                (
                    checklist.is_complete(),
                    serde_json::json!({
                        "checklist_id": checklist_id,
                        "done": done,
                        "total": checklist.items.len(),
                    }),
                )
            }
            None => (
                false,
                serde_json::json!({ "checklist_id": checklist_id, "missing": true }),
            ),
        },
        ValidationRule::RequiredDocument { document_type, document_status } => {
            let passed = task.documents.iter().any(|d| {
                &d.document_type == document_type
                    && document_status.map(|s| d.status == s).unwrap_or(true)
            });
            (
                passed,
                serde_json::json!({
                    "document_type": document_type,
                    "document_status": document_status,
                }),
            )
        }
        ValidationRule::RequiredRelationship { relationship_type } => {
            let passed = task
                .relationships
                .iter()
                .any(|r| &r.kind == relationship_type);
            (
                passed,
                serde_json::json!({ "relationship_type": relationship_type }),
            )
        }
        ValidationRule::CustomCondition { condition: cond } => {
            let outcome = condition::evaluate(cond, task.field(&cond.field).as_ref());
            (
                outcome.passed,
                serde_json::json!({ "condition": cond, "detail": outcome.detail }),
            )
        }
    };

    ValidationResult {
        validation_id: validation.id.clone(),
        validation_type: validation.rule.kind().into(),
        passed,
        behavior: validation.behavior,
        message: validation.message.clone(),
        field_name: validation.rule.field_name().map(String::from),
        details,
    }
}
