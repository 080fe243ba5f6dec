//! ListActions command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{ColumnId, Trigger};
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// List a column's actions, ascending by execution order
#[derive(Debug, Deserialize)]
pub struct ListActions {
    /// The column whose actions to list
    pub column_id: ColumnId,
    /// Only actions firing on this trigger
    pub trigger: Option<Trigger>,
    /// Include soft-deactivated actions
    #[serde(default)]
    pub include_inactive: bool,
}

operation!(ListActions, verb = "list", noun = "actions",
    description = "List a column's actions in execution order");

impl ListActions {
    pub fn new(column_id: impl Into<ColumnId>) -> Self {
        Self {
            column_id: column_id.into(),
            trigger: None,
            include_inactive: false,
        }
    }

    /// Filter to one trigger
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Also return deactivated actions
    pub fn with_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for ListActions {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let actions = ctx
            .column_actions(&self.column_id, self.include_inactive)
            .await?;
        let actions: Vec<_> = actions
            .into_iter()
            .filter(|a| self.trigger.map(|t| a.trigger == t).unwrap_or(true))
            .collect();
        Ok(serde_json::to_value(&actions)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AddAction;
    use crate::types::{ActionKind, StayPolicy};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_filters_by_trigger() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        AddAction::new("proposta", ActionKind::AddTag { tag: "em-negociacao".into() })
            .execute(&ctx)
            .await
            .unwrap();
        AddAction::new(
            "proposta",
            ActionKind::SendNotification {
                recipient: "corretor".into(),
                message: "Proposta parada".into(),
            },
        )
        .with_trigger(Trigger::OnStay)
        .with_stay(StayPolicy { interval_hours: 48, max_executions: 0 })
        .execute(&ctx)
        .await
        .unwrap();

        let all = ListActions::new("proposta").execute(&ctx).await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);

        let stay_only = ListActions::new("proposta")
            .with_trigger(Trigger::OnStay)
            .execute(&ctx)
            .await
            .unwrap();
        let stay_only = stay_only.as_array().unwrap();
        assert_eq!(stay_only.len(), 1);
        assert_eq!(stay_only[0]["type"], "send_notification");
    }
}
