//! Collaborator ports consumed by the engine
//!
//! The engine owns rules and their execution bookkeeping; everything else
//! (tasks, columns, created entities, messaging, score ledgers) belongs to
//! external services reached through these narrow traits. Every call is
//! fallible and bounded by the collaborator; the action executor converts
//! failures into failed results rather than propagating them.

pub mod memory;

use crate::error::Result;
use crate::types::{Column, ColumnId, EntityId, FieldValue, Task, TaskId};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub use memory::{MemoryEntityService, MemoryMessenger, MemoryScoreLedger, MemoryTaskStore};

/// Read/write access to tasks and columns owned by the board service
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Read one task snapshot
    async fn task(&self, id: &TaskId) -> Result<Task>;

    /// Read one column (id, name, position)
    async fn column(&self, id: &ColumnId) -> Result<Column>;

    /// Ids of tasks currently resident in a column
    async fn tasks_in_column(&self, id: &ColumnId) -> Result<Vec<TaskId>>;

    /// Commit a task's new column membership and position
    async fn commit_move(&self, id: &TaskId, to: &ColumnId, position: usize) -> Result<()>;

    /// Write one task field
    async fn set_field(&self, id: &TaskId, field: &str, value: FieldValue) -> Result<()>;

    /// Append a tag to the task
    async fn add_tag(&self, id: &TaskId, tag: &str) -> Result<()>;

    /// Assign a user to the task
    async fn assign_user(&self, id: &TaskId, user_id: &str) -> Result<()>;

    /// Flag the task as incomplete with a reason
    async fn flag_incomplete(&self, id: &TaskId, reason: &str) -> Result<()>;
}

/// Kind of entity a creation action produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Property,
    Client,
    Document,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Property => "property",
            Self::Client => "client",
            Self::Document => "document",
        };
        write!(f, "{}", name)
    }
}

/// Creates domain entities from mapped payloads
#[async_trait]
pub trait EntityService: Send + Sync {
    /// Create an entity and return its id
    async fn create_entity(&self, kind: EntityKind, payload: &Value) -> Result<EntityId>;
}

/// An outbound email, template-resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Delivers emails and notifications
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_email(&self, email: &EmailMessage) -> Result<()>;

    async fn send_notification(&self, recipient: &str, message: &str) -> Result<()>;

    /// Queue an email for delivery after `delay_hours`
    async fn schedule_email(&self, email: &EmailMessage, delay_hours: u32) -> Result<()>;

    /// Enroll a recipient into a drip sequence
    async fn start_sequence(&self, recipient: &str, sequence_id: &str) -> Result<()>;
}

/// Applies gamification point deltas
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    async fn apply_delta(&self, actor: &str, points: i64, reason: &str) -> Result<()>;
}
