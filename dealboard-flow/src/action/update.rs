//! UpdateAction command

use super::checked_kind;
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::types::{ActionId, ActionKind, OriginGate, StayPolicy, Trigger};
use chrono::Utc;
use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Replace an action's configuration (full-replace semantics)
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateAction {
    /// The action to update
    pub id: ActionId,
    pub trigger: Trigger,
    /// The replacement configuration
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(flatten)]
    pub gate: OriginGate,
    pub stay: Option<StayPolicy>,
    /// Deactivate without deleting
    pub is_active: Option<bool>,
}

operation!(UpdateAction, verb = "update", noun = "action",
    description = "Replace an action's configuration");

impl UpdateAction {
    /// Create an UpdateAction carrying the full replacement config
    pub fn new(id: impl Into<ActionId>, trigger: Trigger, kind: ActionKind) -> Self {
        Self {
            id: id.into(),
            trigger,
            kind,
            gate: OriginGate::open(),
            stay: None,
            is_active: None,
        }
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

    /// Activate or deactivate the action
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }
}

#[async_trait]
impl Execute<FlowContext, FlowError> for UpdateAction {
    async fn execute(&self, ctx: &FlowContext) -> Result<Value> {
        let start = std::time::Instant::now();

        let mut action = ctx.read_action(&self.id).await?;
        checked_kind(&self.kind, self.trigger, self.stay.as_ref())?;

        action.trigger = self.trigger;
        action.kind = self.kind.clone();
        action.gate = self.gate.clone();
        action.stay = self.stay;
        if let Some(active) = self.is_active {
            action.is_active = active;
        }
        action.updated_at = Utc::now();

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
