//! AddAction command

use super::checked_kind;
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{Action, ActionId, ActionKind, ColumnId, OriginGate, StayPolicy, Trigger};
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attach an automated action to a column
#[derive(Debug, Deserialize, Serialize)]
pub struct AddAction {
    /// The column the action belongs to
    pub column_id: ColumnId,
    /// Firing trigger; defaults to the kind's default
    pub trigger: Option<Trigger>,
    /// The per-type action configuration
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Optional origin restriction
    #[serde(flatten)]
    pub gate: OriginGate,
    /// Periodic policy, mandatory for on_stay
    pub stay: Option<StayPolicy>,
    /// Execution order within the column/trigger; defaults to last
    pub order: Option<usize>,
}

operation!(AddAction, verb = "add", noun = "action",
    description = "Attach an automated action to a column");

impl AddAction {
    /// Create a new AddAction command with the kind's default trigger
    pub fn new(column_id: impl Into<ColumnId>, kind: ActionKind) -> Self {
        Self {
            column_id: column_id.into(),
            trigger: None,
            kind,
            gate: OriginGate::open(),
            stay: None,
            order: None,
        }
    }

    /// Fire on a specific trigger
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Restrict to moves from a given origin
    pub fn with_gate(mut self, gate: OriginGate) -> Self {
        self.gate = gate;
        self
    }

    /// Set the periodic policy (on_stay only)
    pub fn with_stay(mut self, stay: StayPolicy) -> Self {
        self.stay = Some(stay);
        self
    }

    /// Set the execution order explicitly
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for AddAction {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let start = std::time::Instant::now();

        let trigger = self.trigger.unwrap_or_else(|| self.kind.default_trigger());
        checked_kind(&self.kind, trigger, self.stay.as_ref())?;

        let existing = ctx.column_actions(&self.column_id, false).await?;
        let order = match self.order {
            Some(order) => order,
            None => existing.iter().map(|a| a.order + 1).max().unwrap_or(0),
        };

        let now = Utc::now();
        let action = Action {
            id: ActionId::new(),
            column_id: self.column_id.clone(),
            trigger,
            kind: self.kind.clone(),
            gate: self.gate.clone(),
            stay: self.stay,
            order,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        ctx.write_action(&action).await?;

        let output = serde_json::to_value(&action)?;
        let entry = LogEntry::success(
            self.op_string(),
            serde_json::to_value(self)?,
            output.clone(),
            start.elapsed().as_millis() as u64,
        );
        ctx.append_history(action.id.as_str(), &entry).await?;

        Ok(output)
    }
}
