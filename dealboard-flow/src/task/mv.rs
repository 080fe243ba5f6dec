//! MoveTask command
//!
//! The move runs a fixed state machine:
//!
//! ```text
//! Requested -> Validating -> { Blocked | Validated } -> Executing -> Completed
//! ```
//!
//! Blocked is terminal: the task does not move and no actions run. From
//! Validated the column membership commits first, then origin on_exit
//! actions run before destination on_enter actions - both are part of the
//! same logical move.

use crate::action::{execute_actions, ActionScope};
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::transform::MappingContext;
use crate::types::{
    ActionId, ActionResult, Behavior, Column, ColumnId, Task, TaskId, Trigger, ValidationReport,
};
use crate::validation::evaluate_validations;
use dealboard_operations::{async_trait, operation, Execute, LogEntry};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Move a task to a new column, running validations and actions
#[derive(Debug, Deserialize)]
pub struct MoveTask {
    /// The task to move
    pub task_id: TaskId,
    /// Declared origin column; origin-gated rules are skipped without it
    pub from_column_id: Option<ColumnId>,
    /// Destination column
    pub to_column_id: ColumnId,
    /// Position within the destination; defaults to the end
    pub target_position: Option<usize>,
    /// Admin bypass: skip the validation stage (recorded in the outcome)
    #[serde(default)]
    pub skip_validations: bool,
    /// Admin bypass: skip the action stage (recorded in the outcome)
    #[serde(default)]
    pub skip_actions: bool,
    /// Per-action form data supplied at move time, keyed by action id
    #[serde(default)]
    pub action_data: HashMap<ActionId, Value>,
    /// Caller context for user/project/custom field mapping sources
    #[serde(default)]
    pub mapping: MappingContext,
    /// Acting user, recorded in history and scored when the task has no owner
    pub actor: Option<String>,
}

operation!(MoveTask, verb = "move", noun = "task",
    description = "Move a task to a different column, running its rules");

/// Stages of one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveState {
    Requested,
    Validating,
    Blocked,
    Validated,
    Executing,
    Completed,
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::Validating => "validating",
            Self::Blocked => "blocked",
            Self::Validated => "validated",
            Self::Executing => "executing",
            Self::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

impl MoveTask {
    /// Create a MoveTask with a declared origin
    pub fn new(
        task_id: impl Into<TaskId>,
        from: impl Into<ColumnId>,
        to: impl Into<ColumnId>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            from_column_id: Some(from.into()),
            to_column_id: to.into(),
            target_position: None,
            skip_validations: false,
            skip_actions: false,
            action_data: HashMap::new(),
            mapping: MappingContext::default(),
            actor: None,
        }
    }

    /// Create a MoveTask with no declared origin
    pub fn without_origin(task_id: impl Into<TaskId>, to: impl Into<ColumnId>) -> Self {
        Self {
            from_column_id: None,
            ..Self::new(task_id, "", to)
        }
    }

    /// Target a specific position in the destination
    pub fn at_position(mut self, position: usize) -> Self {
        self.target_position = Some(position);
        self
    }

    /// Bypass the validation stage
    pub fn skipping_validations(mut self) -> Self {
        self.skip_validations = true;
        self
    }

    /// Bypass the action stage
    pub fn skipping_actions(mut self) -> Self {
        self.skip_actions = true;
        self
    }

    /// Supply form data for one action
    pub fn with_action_data(mut self, action_id: impl Into<ActionId>, data: Value) -> Self {
        self.action_data.insert(action_id.into(), data);
        self
    }

    /// Supply the mapping context
    pub fn with_mapping(mut self, mapping: MappingContext) -> Self {
        self.mapping = mapping;
        self
    }

    /// Record the acting user
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    fn transition(&self, from: MoveState, to: MoveState) -> MoveState {
        tracing::info!(task = %self.task_id, %from, %to, "move transition");
        to
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for MoveTask {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let task = ctx.collab.tasks.task(&self.task_id).await?;
        let destination = ctx.collab.tasks.column(&self.to_column_id).await?;
        let origin = match &self.from_column_id {
            Some(id) => Some(ctx.collab.tasks.column(id).await?),
            None => None,
        };

        let mut state = MoveState::Requested;

        // Validation stage
        state = self.transition(state, MoveState::Validating);
        let report = if self.skip_validations {
            tracing::info!(task = %self.task_id, "validation stage bypassed");
            ValidationReport { results: Vec::new(), blocked: false }
        } else {
            evaluate_validations(ctx, &task, origin.as_ref(), &destination).await?
        };
        self.record_validation_runs(ctx, &report).await;

        if report.blocked {
            state = self.transition(state, MoveState::Blocked);
            debug_assert_eq!(state, MoveState::Blocked);
            return Ok(self.blocked_payload(&report));
        }
        state = self.transition(state, MoveState::Validated);

        // The move commits before any side effects run
        let position = match self.target_position {
            Some(position) => position,
            None => {
                ctx.collab
                    .tasks
                    .tasks_in_column(&destination.id)
                    .await?
                    .len()
            }
        };
        ctx.collab
            .tasks
            .commit_move(&task.id, &destination.id, position)
            .await?;

        // Failing mark_incomplete rules flag the moved task
        for result in report.results.iter().filter(|r| {
            !r.passed && matches!(r.behavior, Behavior::MarkIncomplete)
        }) {
            if let Err(err) = ctx
                .collab
                .tasks
                .flag_incomplete(&task.id, &result.message)
                .await
            {
                tracing::warn!(task = %task.id, error = %err, "failed to flag task incomplete");
            }
        }

        // Action stage
        state = self.transition(state, MoveState::Executing);
        let action_results = if self.skip_actions {
            tracing::info!(task = %self.task_id, "action stage bypassed");
            Vec::new()
        } else {
            self.run_actions(ctx, &task, origin.as_ref(), &destination).await?
        };

        state = self.transition(state, MoveState::Completed);
        debug_assert_eq!(state, MoveState::Completed);

        // Re-read so the response reflects what the actions wrote
        let moved = ctx.collab.tasks.task(&task.id).await?;

        Ok(serde_json::json!({
            "task": moved,
            "task_id": task.id,
            "from": self.from_column_id,
            "to": destination.id,
            "position": position,
            "blocked": false,
            "validation_results": report.results,
            "action_results": action_results,
            "warnings": report.warnings(),
            "validations_skipped": self.skip_validations,
            "actions_skipped": self.skip_actions,
        }))
    }
}

impl MoveTask {
    /// Origin on_exit actions fire before destination on_enter actions
    async fn run_actions(
        &self,
        ctx: &FlowContext,
        task: &Task,
        origin: Option<&Column>,
        destination: &Column,
    ) -> Result<Vec<ActionResult>> {
        let scope = ActionScope {
            task,
            origin,
            destination,
            mapping: &self.mapping,
            action_data: &self.action_data,
            actor: self.actor.as_deref(),
        };

        let mut results = Vec::new();
        if let Some(origin) = origin {
            results.extend(execute_actions(ctx, Trigger::OnExit, origin, &scope).await?);
        }
        results.extend(execute_actions(ctx, Trigger::OnEnter, destination, &scope).await?);
        Ok(results)
    }

    /// Append one history entry per evaluated validation
    async fn record_validation_runs(&self, ctx: &FlowContext, report: &ValidationReport) {
        for result in &report.results {
            let outcome = if result.passed { "passed" } else { "failed" };
            let entry = LogEntry::new(
                "run validation",
                serde_json::json!({
                    "task_id": self.task_id,
                    "from": self.from_column_id,
                    "to": self.to_column_id,
                }),
                serde_json::json!({ "outcome": outcome, "result": result }),
                self.actor.clone(),
                0,
            );
            if let Err(err) = ctx
                .append_history(result.validation_id.as_str(), &entry)
                .await
            {
                tracing::warn!(
                    validation = %result.validation_id,
                    error = %err,
                    "failed to record validation history"
                );
            }
        }
    }

    /// The structured refusal: every failing rule, not just the first
    fn blocked_payload(&self, report: &ValidationReport) -> Value {
        let failed: Vec<Value> = report
            .failed()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "validation_id": r.validation_id,
                    "validation_type": r.validation_type,
                    "message": r.message,
                    "details": r.details,
                    "field_name": r.field_name,
                })
            })
            .collect();

        serde_json::json!({
            "blocked": true,
            "task_id": self.task_id,
            "failed_validations": failed,
            "total_failed": failed.len(),
            "validation_results": report.results,
        })
    }
}
