//! ReorderActions command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{ActionId, ColumnId};
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// Rewrite a column's action order.
///
/// The id list must name exactly the column's active actions; orders are
/// rewritten densely from zero in list order.
#[derive(Debug, Deserialize)]
pub struct ReorderActions {
    /// The column being reordered
    pub column_id: ColumnId,
    /// Action ids in their new execution order
    pub ids: Vec<ActionId>,
}

operation!(ReorderActions, verb = "reorder", noun = "actions",
    description = "Rewrite a column's action execution order");

impl ReorderActions {
    pub fn new(column_id: impl Into<ColumnId>, ids: Vec<ActionId>) -> Self {
        Self {
            column_id: column_id.into(),
            ids,
        }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for ReorderActions {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let existing = ctx.column_actions(&self.column_id, false).await?;

        if existing.len() != self.ids.len()
            || !existing.iter().all(|a| self.ids.contains(&a.id))
        {
            return Err(FlowError::invalid_value(
                "ids",
                format!(
                    "reorder must list exactly the {} active actions of column '{}'",
                    existing.len(),
                    self.column_id
                ),
            ));
        }

        let now = Utc::now();
        for (order, id) in self.ids.iter().enumerate() {
            let mut action = existing
                .iter()
                .find(|a| &a.id == id)
                .cloned()
                .expect("id membership checked above");
            action.order = order;
            action.updated_at = now;
            ctx.write_action(&action).await?;
        }

        let reordered = ctx.column_actions(&self.column_id, false).await?;
        Ok(serde_json::to_value(&reordered)?)
    }
}
