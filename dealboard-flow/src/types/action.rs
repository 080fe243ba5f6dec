//! Automated action types

use super::gate::OriginGate;
use super::ids::{ActionId, ColumnId, EntityId};
use super::mapping::FieldMapping;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The transition moment that fires an action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnEnter,
    OnExit,
    OnStay,
}

/// Task priority set by `set_priority` actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// The wire name of this priority
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Periodic execution policy for `on_stay` actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StayPolicy {
    /// Hours between executions while the task stays in the column
    pub interval_hours: u32,
    /// Cap on executions per task; 0 means unlimited
    #[serde(default)]
    pub max_executions: u32,
}

/// The per-type action configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    CreateProperty { mappings: Vec<FieldMapping> },
    CreateClient { mappings: Vec<FieldMapping> },
    CreateDocument { mappings: Vec<FieldMapping> },
    AssignUser { user_id: String },
    SetPriority { priority: Priority },
    SetDueDate { days_from_now: i64 },
    AddTag { tag: String },
    SendEmail { recipient: String, subject: String, body: String },
    SendNotification { recipient: String, message: String },
    ScheduleEmail { recipient: String, subject: String, body: String, delay_hours: u32 },
    StartEmailSequence { recipient: String, sequence_id: String },
    UpdateScore {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        points: Option<i64>,
    },
}

/// Points applied by `update_score` when no explicit value is configured
pub const DEFAULT_SCORE_POINTS: i64 = 10;

impl ActionKind {
    /// The wire name of this action type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateProperty { .. } => "create_property",
            Self::CreateClient { .. } => "create_client",
            Self::CreateDocument { .. } => "create_document",
            Self::AssignUser { .. } => "assign_user",
            Self::SetPriority { .. } => "set_priority",
            Self::SetDueDate { .. } => "set_due_date",
            Self::AddTag { .. } => "add_tag",
            Self::SendEmail { .. } => "send_email",
            Self::SendNotification { .. } => "send_notification",
            Self::ScheduleEmail { .. } => "schedule_email",
            Self::StartEmailSequence { .. } => "start_email_sequence",
            Self::UpdateScore { .. } => "update_score",
        }
    }

    /// The triggers this action type may fire on.
    ///
    /// Entity creation is an enter-only effect; task mutation fires around
    /// the transition itself; messaging is valid anywhere; score updates
    /// reward arrival or persistence, never departure.
    pub fn allowed_triggers(&self) -> &'static [Trigger] {
        use Trigger::*;
        match self {
            Self::CreateProperty { .. } | Self::CreateClient { .. } | Self::CreateDocument { .. } => {
                &[OnEnter]
            }
            Self::AssignUser { .. }
            | Self::SetPriority { .. }
            | Self::SetDueDate { .. }
            | Self::AddTag { .. } => &[OnEnter, OnExit],
            Self::SendEmail { .. }
            | Self::SendNotification { .. }
            | Self::ScheduleEmail { .. }
            | Self::StartEmailSequence { .. } => &[OnEnter, OnExit, OnStay],
            Self::UpdateScore { .. } => &[OnEnter, OnStay],
        }
    }

    /// The trigger used when a client does not pick one
    pub fn default_trigger(&self) -> Trigger {
        Trigger::OnEnter
    }

    /// Mappings carried by entity-creation kinds
    pub fn mappings(&self) -> Option<&[FieldMapping]> {
        match self {
            Self::CreateProperty { mappings }
            | Self::CreateClient { mappings }
            | Self::CreateDocument { mappings } => Some(mappings),
            _ => None,
        }
    }

    /// Whether this kind creates an entity (and so participates in the
    /// idempotent bypass)
    pub fn creates_entity(&self) -> bool {
        self.mappings().is_some()
    }
}

/// An automated side effect attached to a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub column_id: ColumnId,
    pub trigger: Trigger,
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(flatten)]
    pub gate: OriginGate,
    /// Present exactly when `trigger` is `on_stay`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stay: Option<StayPolicy>,
    pub order: usize,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of executing one action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: ActionId,
    pub action_type: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_entity_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub already_executed: bool,
}

impl ActionResult {
    /// A successful run
    pub fn success(action: &Action, message: impl Into<String>) -> Self {
        Self {
            action_id: action.id.clone(),
            action_type: action.kind.kind().into(),
            success: true,
            message: message.into(),
            created_entity_id: None,
            error: None,
            already_executed: false,
        }
    }

    /// A failed run; the error is isolated to this result
    pub fn failure(action: &Action, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            action_id: action.id.clone(),
            action_type: action.kind.kind().into(),
            success: false,
            message: format!("{} failed", action.kind.kind()),
            created_entity_id: None,
            error: Some(error),
            already_executed: false,
        }
    }

    /// Attach the created entity id
    pub fn with_entity(mut self, id: EntityId) -> Self {
        self.created_entity_id = Some(id);
        self
    }

    /// Mark as bypassed because a previous run already produced the effect
    pub fn bypassed(mut self) -> Self {
        self.already_executed = true;
        self
    }
}
