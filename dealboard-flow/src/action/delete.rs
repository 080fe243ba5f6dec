//! DeleteAction command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::ActionId;
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delete an action.
///
/// Actions that have been executed are soft-deactivated so their history
/// stays reviewable; actions that never ran are removed.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteAction {
    /// The action to delete
    pub id: ActionId,
}

operation!(DeleteAction, verb = "delete", noun = "action",
    description = "Delete or deactivate an action");

impl DeleteAction {
    pub fn new(id: impl Into<ActionId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for DeleteAction {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let start = std::time::Instant::now();
        let mut action = ctx.read_action(&self.id).await?;

        let soft = ctx.history_has_runs(self.id.as_str()).await?;
        if soft {
            action.is_active = false;
            action.updated_at = Utc::now();
            ctx.write_action(&action).await?;
        } else {
            ctx.delete_action_file(&self.id).await?;
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
