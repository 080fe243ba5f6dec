//! CheckMove command

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{ColumnId, TaskId};
use crate::validation::evaluate_validations;
use dealboard_operations::{async_trait, operation, Execute};
use serde::Deserialize;
use serde_json::Value;

/// Dry-run a candidate move's validations.
///
/// Nothing commits, no actions fire, and no history is written - this is
/// the preflight clients use to show whether a drop would be refused.
#[derive(Debug, Deserialize)]
pub struct CheckMove {
    /// The task to check
    pub task_id: TaskId,
    /// Declared origin column; origin-gated rules are skipped without it
    pub from_column_id: Option<ColumnId>,
    /// Candidate destination column
    pub to_column_id: ColumnId,
}

operation!(CheckMove, verb = "check", noun = "move",
    description = "Evaluate a candidate move's validations without moving");

impl CheckMove {
    pub fn new(
        task_id: impl Into<TaskId>,
        from: impl Into<ColumnId>,
        to: impl Into<ColumnId>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            from_column_id: Some(from.into()),
            to_column_id: to.into(),
        }
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for CheckMove {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let task = ctx.collab.tasks.task(&self.task_id).await?;
        let destination = ctx.collab.tasks.column(&self.to_column_id).await?;
        let origin = match &self.from_column_id {
            Some(id) => Some(ctx.collab.tasks.column(id).await?),
            None => None,
        };

        let report = evaluate_validations(ctx, &task, origin.as_ref(), &destination).await?;

        Ok(serde_json::json!({
            "blocked": report.blocked,
            "validation_results": report.results,
            "warnings": report.warnings(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Behavior, Column, Task, ValidationRule};
    use crate::validation::AddValidation;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_does_not_move_or_log() {
        let temp = TempDir::new().unwrap();
        let (ctx, memory) = FlowContext::with_memory(temp.path().join(".dealboard"));

        memory.tasks.insert_column(Column::new("visita", "Visita", 1));
        memory.tasks.insert_column(Column::new("proposta", "Proposta", 2));
        memory.tasks.insert_task(Task::new("t1", "Casa", "visita"));

        let added = AddValidation::new(
            "proposta",
            ValidationRule::RequiredField { field: "client".into() },
            Behavior::Block,
            "Vincule um cliente",
        )
        .execute(&ctx)
        .await
        .unwrap();
        let validation_id = added["id"].as_str().unwrap().to_string();

        let result = CheckMove::new("t1", "visita", "proposta")
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(result["blocked"], true);
        assert_eq!(result["validation_results"].as_array().unwrap().len(), 1);

        // Task stayed put and no run history was written
        let task = memory.tasks.get_task(&"t1".into()).unwrap();
        assert_eq!(task.column.as_str(), "visita");
        assert!(!ctx.history_has_runs(&validation_id).await.unwrap());
    }
}
