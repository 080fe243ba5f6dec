//! GetValidation command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::ValidationId;
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// Read a single validation rule
#[derive(Debug, Deserialize)]
pub struct GetValidation {
    /// The validation to read
    pub id: ValidationId,
}

operation!(GetValidation, verb = "get", noun = "validation",
    description = "Read a validation rule");

impl GetValidation {
    pub fn new(id: impl Into<ValidationId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for GetValidation {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let validation = ctx.read_validation(&self.id).await?;
        Ok(serde_json::to_value(&validation)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Behavior, ValidationRule};
    use crate::validation::AddValidation;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_validation() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        let added = AddValidation::new(
            "proposta",
            ValidationRule::RequiredRelationship { relationship_type: "client".into() },
            Behavior::Block,
            "Vincule um cliente",
        )
        .execute(&ctx)
        .await
        .unwrap();
        let id = added["id"].as_str().unwrap();

        let result = GetValidation::new(id).execute(&ctx).await.unwrap();
        assert_eq!(result["type"], "required_relationship");
        assert_eq!(result["relationship_type"], "client");
    }

    #[tokio::test]
    async fn test_get_missing_validation() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        let err = GetValidation::new("nonexistent").execute(&ctx).await;
        assert!(matches!(err, Err(FlowError::ValidationNotFound { .. })));
    }
}
