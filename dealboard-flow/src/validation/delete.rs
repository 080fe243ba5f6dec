//! DeleteValidation command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::ValidationId;
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delete a validation rule.
///
/// Rules that have been run against tasks are soft-deactivated so their
/// execution history stays reviewable; rules that never ran are removed.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteValidation {
    /// The validation to delete
    pub id: ValidationId,
}

operation!(DeleteValidation, verb = "delete", noun = "validation",
    description = "Delete or deactivate a validation rule");

impl DeleteValidation {
    pub fn new(id: impl Into<ValidationId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for DeleteValidation {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let start = std::time::Instant::now();
        let mut validation = ctx.read_validation(&self.id).await?;

        let soft = ctx.history_has_runs(self.id.as_str()).await?;
        if soft {
            validation.is_active = false;
            validation.updated_at = Utc::now();
            ctx.write_validation(&validation).await?;
        } else {
            ctx.delete_validation_file(&self.id).await?;
        }

        let output = serde_json::json!({
            "deleted": true,
            "soft": soft,
            "id": self.id.to_string(),
        });

        if soft {
            let entry = LogEntry::success(
                self.op_string(),
                serde_json::to_value(self)?,
                output.clone(),
                start.elapsed().as_millis() as u64,
            );
            ctx.append_history(self.id.as_str(), &entry).await?;
        }

        Ok(output)
    }
}
