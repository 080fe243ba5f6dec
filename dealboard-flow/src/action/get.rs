//! GetAction command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::ActionId;
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// Read a single action
#[derive(Debug, Deserialize)]
pub struct GetAction {
    /// The action to read
    pub id: ActionId,
}

operation!(GetAction, verb = "get", noun = "action", description = "Read an action");

impl GetAction {
    pub fn new(id: impl Into<ActionId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for GetAction {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let action = ctx.read_action(&self.id).await?;
        Ok(serde_json::to_value(&action)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AddAction;
    use crate::types::ActionKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_action() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        let added = AddAction::new(
            "fechamento",
            ActionKind::UpdateScore { points: Some(25) },
        )
        .execute(&ctx)
        .await
        .unwrap();
        let id = added["id"].as_str().unwrap();

        let result = GetAction::new(id).execute(&ctx).await.unwrap();
        assert_eq!(result["type"], "update_score");
        assert_eq!(result["points"], 25);
    }

    #[tokio::test]
    async fn test_get_missing_action() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        let err = GetAction::new("nonexistent").execute(&ctx).await;
        assert!(matches!(err, Err(FlowError::ActionNotFound { .. })));
    }
}
