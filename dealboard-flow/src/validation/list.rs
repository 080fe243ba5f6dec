//! ListValidations command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::ColumnId;
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// List a column's validations, ascending by evaluation order
#[derive(Debug, Deserialize)]
pub struct ListValidations {
    /// The column whose rules to list
    pub column_id: ColumnId,
    /// Include soft-deactivated rules
    #[serde(default)]
    pub include_inactive: bool,
}

operation!(ListValidations, verb = "list", noun = "validations",
    description = "List a column's validation rules in evaluation order");

impl ListValidations {
    pub fn new(column_id: impl Into<ColumnId>) -> Self {
        Self {
            column_id: column_id.into(),
            include_inactive: false,
        }
    }

    /// Also return deactivated rules
    pub fn with_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for ListValidations {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let validations = ctx
            .column_validations(&self.column_id, self.include_inactive)
            .await?;
        Ok(serde_json::to_value(&validations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Behavior, ValidationRule};
    use crate::validation::{AddValidation, DeleteValidation};
    use dealboard_operations::LogEntry;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = FlowContext::with_memory(temp.path().join(".dealboard"));

        for (field, msg) in [("a", "first"), ("b", "second")] {
            AddValidation::new(
                "proposta",
                ValidationRule::RequiredField { field: field.into() },
                Behavior::Block,
                msg,
            )
            .execute(&ctx)
            .await
            .unwrap();
        }

        let listed = ListValidations::new("proposta").execute(&ctx).await.unwrap();
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["message"], "first");
        assert_eq!(listed[1]["message"], "second");

        // Soft-delete the first, then list both ways
        let id = listed[0]["id"].as_str().unwrap().to_string();
        let run = LogEntry::success("run validation", Value::Null, Value::Null, 1);
        ctx.append_history(&id, &run).await.unwrap();
        DeleteValidation::new(id.as_str()).execute(&ctx).await.unwrap();

        let active = ListValidations::new("proposta").execute(&ctx).await.unwrap();
        assert_eq!(active.as_array().unwrap().len(), 1);

        let all = ListValidations::new("proposta")
            .with_inactive()
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);
    }
}
