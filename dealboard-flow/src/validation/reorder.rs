//! ReorderValidations command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{ColumnId, ValidationId};
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// Rewrite a column's validation order.
///
/// The id list must name exactly the column's active rules; orders are
/// rewritten densely from zero in list order.
#[derive(Debug, Deserialize)]
pub struct ReorderValidations {
    /// The column being reordered
    pub column_id: ColumnId,
    /// Rule ids in their new evaluation order
    pub ids: Vec<ValidationId>,
}

operation!(ReorderValidations, verb = "reorder", noun = "validations",
    description = "Rewrite a column's validation evaluation order");

impl ReorderValidations {
    pub fn new(column_id: impl Into<ColumnId>, ids: Vec<ValidationId>) -> Self {
        Self {
            column_id: column_id.into(),
            ids,
        }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for ReorderValidations {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let existing = ctx.column_validations(&self.column_id, false).await?;

        if existing.len() != self.ids.len()
            || !existing.iter().all(|v| self.ids.contains(&v.id))
        {
            return Err(FlowError::invalid_value(
                "ids",
                format!(
                    "reorder must list exactly the {} active rules of column '{}'",
                    existing.len(),
                    self.column_id
                ),
            ));
        }

        let now = Utc::now();
        for (order, id) in self.ids.iter().enumerate() {
            let mut validation = existing
                .iter()
                .find(|v| &v.id == id)
                .cloned()
                .expect("id membership checked above");
            validation.order = order;
            validation.updated_at = now;
            ctx.write_validation(&validation).await?;
        }

        let reordered = ctx.column_validations(&self.column_id, false).await?;
        Ok(serde_json::to_value(&reordered)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Behavior, ValidationRule};
    use crate::validation::AddValidation;
    use tempfile::TempDir;

    async fn setup_with_rules() -> (TempDir, FlowContext, Vec<ValidationId>) {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        let mut ids = Vec::new();
        for field in ["a", "b", "c"] {
            let result = AddValidation::new(
                "proposta",
                ValidationRule::RequiredField { field: field.into() },
                Behavior::Block,
                "msg",
            )
            .execute(&ctx)
            .await
            .unwrap();
            ids.push(ValidationId::from_string(result["id"].as_str().unwrap()));
        }
        (temp, ctx, ids)
    }

    #[tokio::test]
    async fn test_reorder_rewrites_densely() {
        let (_temp, ctx, ids) = setup_with_rules().await;

        let reversed: Vec<ValidationId> = ids.iter().rev().cloned().collect();
        let result = ReorderValidations::new("proposta", reversed.clone())
            .execute(&ctx)
            .await
            .unwrap();

        let result = result.as_array().unwrap();
        for (i, validation) in result.iter().enumerate() {
            assert_eq!(validation["order"], i);
            assert_eq!(validation["id"], reversed[i].as_str());
        }
    }

    #[tokio::test]
    async fn test_reorder_requires_full_id_set() {
        let (_temp, ctx, ids) = setup_with_rules().await;

        let err = ReorderValidations::new("proposta", ids[..2].to_vec())
            .execute(&ctx)
            .await;
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));

        let err = ReorderValidations::new(
            "proposta",
            vec![ids[0].clone(), ids[1].clone(), ValidationId::from_string("stranger")],
        )
        .execute(&ctx)
        .await;
        assert!(matches!(err, Err(FlowError::InvalidValue { .. })));
    }
}
