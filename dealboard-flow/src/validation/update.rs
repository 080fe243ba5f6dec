//! UpdateValidation command

use super::checked_rule;
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{Behavior, OriginGate, ValidationId, ValidationRule};
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Replace a validation's configuration (full-replace semantics)
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateValidation {
    /// The validation to update
    pub id: ValidationId,
    /// The replacement rule configuration
    #[serde(flatten)]
    pub rule: ValidationRule,
    pub behavior: Behavior,
    pub message: String,
    #[serde(flatten)]
    pub gate: OriginGate,
    /// Deactivate without deleting
    pub is_active: Option<bool>,
}

operation!(UpdateValidation, verb = "update", noun = "validation",
    description = "Replace a validation rule's configuration");

impl UpdateValidation {
    /// Create an UpdateValidation carrying the full replacement config
    pub fn new(
        id: impl Into<ValidationId>,
        rule: ValidationRule,
        behavior: Behavior,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule,
            behavior,
            message: message.into(),
            gate: OriginGate::open(),
            is_active: None,
        }
    }

    /// Restrict the rule to moves from a given origin
    pub fn with_gate(mut self, gate: OriginGate) -> Self {
        self.gate = gate;
        self
    }

    /// Activate or deactivate the rule
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for UpdateValidation {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let start = std::time::Instant::now();

        let mut validation = ctx.read_validation(&self.id).await?;
        let rule = checked_rule(self.rule.clone(), &self.message)?;

        // The replacement must not collide with the column's other rules
        let siblings = ctx.column_validations(&validation.column_id, false).await?;
        if siblings
            .iter()
            .any(|v| v.id != self.id && v.rule.duplicates(&rule))
        {
            return Err(FlowError::DuplicateRule {
                rule_type: rule.kind().into(),
                column_id: validation.column_id.to_string(),
            });
        }

        validation.rule = rule;
        validation.behavior = self.behavior;
        validation.message = self.message.clone();
        validation.gate = self.gate.clone();
        if let Some(active) = self.is_active {
            validation.is_active = active;
        }
        validation.updated_at = Utc::now();

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
