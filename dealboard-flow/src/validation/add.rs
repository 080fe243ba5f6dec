//! AddValidation command

use super::checked_rule;
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{
    Behavior, ColumnId, OriginGate, Validation, ValidationId, ValidationRule,
    MAX_ACTIVE_VALIDATIONS,
};
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attach a validation rule to a column
#[derive(Debug, Deserialize, Serialize)]
pub struct AddValidation {
    /// The column the rule guards
    pub column_id: ColumnId,
    /// The per-type rule configuration
    #[serde(flatten)]
    pub rule: ValidationRule,
    /// Effect of a failure
    pub behavior: Behavior,
    /// User-facing failure message (mandatory, non-empty)
    pub message: String,
    /// Optional origin restriction
    #[serde(flatten)]
    pub gate: OriginGate,
    /// Evaluation order within the column; defaults to last
    pub order: Option<usize>,
}

operation!(AddValidation, verb = "add", noun = "validation",
    description = "Attach a validation rule to a column");

impl AddValidation {
    /// Create a new AddValidation command
    pub fn new(
        column_id: impl Into<ColumnId>,
        rule: ValidationRule,
        behavior: Behavior,
        message: impl Into<String>,
    ) -> Self {
        Self {
            column_id: column_id.into(),
            rule,
            behavior,
            message: message.into(),
            gate: OriginGate::open(),
            order: None,
        }
    }

    /// Restrict the rule to moves from a given origin
    pub fn with_gate(mut self, gate: OriginGate) -> Self {
        self.gate = gate;
        self
    }

    /// Set the evaluation order explicitly
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for AddValidation {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let start = std::time::Instant::now();

        let rule = checked_rule(self.rule.clone(), &self.message)?;

        let existing = ctx.column_validations(&self.column_id, false).await?;
        if existing.len() >= MAX_ACTIVE_VALIDATIONS {
            return Err(FlowError::ValidationLimit {
                column_id: self.column_id.to_string(),
                limit: MAX_ACTIVE_VALIDATIONS,
            });
        }
        if existing.iter().any(|v| v.rule.duplicates(&rule)) {
            return Err(FlowError::DuplicateRule {
                rule_type: rule.kind().into(),
                column_id: self.column_id.to_string(),
            });
        }

        let order = match self.order {
            Some(order) => order,
            None => existing.iter().map(|v| v.order + 1).max().unwrap_or(0),
        };

        let now = Utc::now();
        let validation = Validation {
            id: ValidationId::new(),
            column_id: self.column_id.clone(),
            rule,
            behavior: self.behavior,
            message: self.message.clone(),
            gate: self.gate.clone(),
            order,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        ctx.write_validation(&validation).await?;

        let output = serde_json::to_value(&validation)?;
        let entry = LogEntry::success(
            self.op_string(),
            serde_json::to_value(self)?,
            output.clone(),
            start.elapsed().as_millis() as u64,
        );
        ctx.append_history(validation.id.as_str(), &entry).await?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn required_field(field: &str) -> ValidationRule {
        ValidationRule::RequiredField { field: field.into() }
    }

    async fn setup() -> (TempDir, FlowContext) {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));
        (temp, ctx)
    }

    #[tokio::test]
    async fn test_add_validation() {
        let (_temp, ctx) = setup().await;

        let result = AddValidation::new(
            "proposta",
            required_field("client"),
            Behavior::Block,
            "Vincule um cliente antes de avançar",
        )
        .execute(&ctx)
        .await
        .unwrap();

        assert_eq!(result["type"], "required_field");
        assert_eq!(result["order"], 0);
        assert_eq!(result["is_active"], true);
    }

    #[tokio::test]
    async fn test_order_defaults_to_last() {
        let (_temp, ctx) = setup().await;

        AddValidation::new("proposta", required_field("a"), Behavior::Block, "msg a")
            .execute(&ctx)
            .await
            .unwrap();
        let second =
            AddValidation::new("proposta", required_field("b"), Behavior::Warn, "msg b")
                .execute(&ctx)
                .await
                .unwrap();

        assert_eq!(second["order"], 1);
    }

    #[tokio::test]
    async fn test_fourth_validation_rejected() {
        let (_temp, ctx) = setup().await;

        for field in ["a", "b", "c"] {
            AddValidation::new("proposta", required_field(field), Behavior::Block, "msg")
                .execute(&ctx)
                .await
                .unwrap();
        }

        let err = AddValidation::new("proposta", required_field("d"), Behavior::Block, "msg")
            .execute(&ctx)
            .await;
        assert!(matches!(err, Err(FlowError::ValidationLimit { limit: 3, .. })));

        // A different column is unaffected
        AddValidation::new("fechamento", required_field("d"), Behavior::Block, "msg")
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_rule_rejected() {
        let (_temp, ctx) = setup().await;

        AddValidation::new("proposta", required_field("client"), Behavior::Block, "msg")
            .execute(&ctx)
            .await
            .unwrap();

        let err =
            AddValidation::new("proposta", required_field("client"), Behavior::Warn, "other")
                .execute(&ctx)
                .await;
        assert!(matches!(err, Err(FlowError::DuplicateRule { .. })));

        // Different field is not a duplicate
        AddValidation::new("proposta", required_field("phone"), Behavior::Warn, "msg")
            .execute(&ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_configuration_persists_nothing() {
        let (_temp, ctx) = setup().await;

        let err = AddValidation::new("proposta", required_field("x"), Behavior::Block, "")
            .execute(&ctx)
            .await;
        assert!(matches!(err, Err(FlowError::MissingMessage)));

        let stored = ctx
            .column_validations(&ColumnId::from_string("proposta"), true)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
