//! In-memory collaborator implementations
//!
//! Used by the test suites and by embedders that wire the engine without
//! real services. Every implementation records what it was asked to do and
//! the messenger/entity service can be told to fail their next call, which
//! is how partial-failure handling is exercised end-to-end.

use super::{EmailMessage, EntityKind, EntityService, Messenger, ScoreLedger, TaskStore};
use crate::error::{FlowError, Result};
use crate::types::{Column, ColumnId, EntityId, FieldValue, Task, TaskId};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Task/column store backed by hash maps
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    columns: Mutex<HashMap<ColumnId, Column>>,
    incomplete: Mutex<Vec<(TaskId, String)>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a column
    pub fn insert_column(&self, column: Column) {
        self.columns.lock().unwrap().insert(column.id.clone(), column);
    }

    /// Seed a task
    pub fn insert_task(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id.clone(), task);
    }

    /// Snapshot a task for assertions
    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.lock().unwrap().get(id).cloned()
    }

    /// Tasks flagged incomplete, with reasons
    pub fn incomplete_flags(&self) -> Vec<(TaskId, String)> {
        self.incomplete.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn task(&self, id: &TaskId) -> Result<Task> {
        self.tasks
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| FlowError::TaskNotFound { id: id.to_string() })
    }

    async fn column(&self, id: &ColumnId) -> Result<Column> {
        self.columns
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| FlowError::ColumnNotFound { id: id.to_string() })
    }

    async fn tasks_in_column(&self, id: &ColumnId) -> Result<Vec<TaskId>> {
        let mut ids: Vec<TaskId> = self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| &t.column == id)
            .map(|t| t.id.clone())
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }

    async fn commit_move(&self, id: &TaskId, to: &ColumnId, position: usize) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| FlowError::TaskNotFound { id: id.to_string() })?;
        task.column = to.clone();
        task.position = position;
        Ok(())
    }

    async fn set_field(&self, id: &TaskId, field: &str, value: FieldValue) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| FlowError::TaskNotFound { id: id.to_string() })?;
        task.fields.insert(field.to_string(), value);
        Ok(())
    }

    async fn add_tag(&self, id: &TaskId, tag: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| FlowError::TaskNotFound { id: id.to_string() })?;
        let tags = match task.fields.get_mut("tags") {
            Some(FieldValue::List(tags)) => tags,
            _ => {
                task.fields.insert("tags".into(), FieldValue::List(Vec::new()));
                match task.fields.get_mut("tags") {
                    Some(FieldValue::List(tags)) => tags,
                    _ => unreachable!(),
                }
            }
        };
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
        Ok(())
    }

    async fn assign_user(&self, id: &TaskId, user_id: &str) -> Result<()> {
        self.set_field(id, "assigned_to", FieldValue::Text(user_id.to_string()))
            .await
    }

    async fn flag_incomplete(&self, id: &TaskId, reason: &str) -> Result<()> {
        self.incomplete
            .lock()
            .unwrap()
            .push((id.clone(), reason.to_string()));
        Ok(())
    }
}

/// Entity service that records every payload it was asked to create
#[derive(Default)]
pub struct MemoryEntityService {
    created: Mutex<Vec<(EntityKind, EntityId, Value)>>,
    fail_next: AtomicBool,
}

impl MemoryEntityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_entity` call fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Everything created so far
    pub fn created(&self) -> Vec<(EntityKind, EntityId, Value)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityService for MemoryEntityService {
    async fn create_entity(&self, kind: EntityKind, payload: &Value) -> Result<EntityId> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FlowError::collaborator("entity-service", "unavailable"));
        }
        let id = EntityId::new();
        self.created
            .lock()
            .unwrap()
            .push((kind, id.clone(), payload.clone()));
        Ok(id)
    }
}

/// What the memory messenger delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Email(EmailMessage),
    Notification { recipient: String, message: String },
    Scheduled { email: EmailMessage, delay_hours: u32 },
    Sequence { recipient: String, sequence_id: String },
}

/// Messenger that records deliveries instead of sending them
#[derive(Default)]
pub struct MemoryMessenger {
    deliveries: Mutex<Vec<Delivery>>,
    fail_next: AtomicBool,
}

impl MemoryMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next delivery call fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Everything delivered so far
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FlowError::collaborator("messenger", "timeout"));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for MemoryMessenger {
    async fn send_email(&self, email: &EmailMessage) -> Result<()> {
        self.check_failure()?;
        self.deliveries
            .lock()
            .unwrap()
            .push(Delivery::Email(email.clone()));
        Ok(())
    }

    async fn send_notification(&self, recipient: &str, message: &str) -> Result<()> {
        self.check_failure()?;
        self.deliveries.lock().unwrap().push(Delivery::Notification {
            recipient: recipient.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn schedule_email(&self, email: &EmailMessage, delay_hours: u32) -> Result<()> {
        self.check_failure()?;
        self.deliveries.lock().unwrap().push(Delivery::Scheduled {
            email: email.clone(),
            delay_hours,
        });
        Ok(())
    }

    async fn start_sequence(&self, recipient: &str, sequence_id: &str) -> Result<()> {
        self.check_failure()?;
        self.deliveries.lock().unwrap().push(Delivery::Sequence {
            recipient: recipient.to_string(),
            sequence_id: sequence_id.to_string(),
        });
        Ok(())
    }
}

/// Score ledger that accumulates deltas per actor
#[derive(Default)]
pub struct MemoryScoreLedger {
    deltas: Mutex<Vec<(String, i64, String)>>,
}

impl MemoryScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total points for an actor
    pub fn total(&self, actor: &str) -> i64 {
        self.deltas
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _, _)| a == actor)
            .map(|(_, p, _)| p)
            .sum()
    }

    /// All recorded deltas
    pub fn deltas(&self) -> Vec<(String, i64, String)> {
        self.deltas.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreLedger for MemoryScoreLedger {
    async fn apply_delta(&self, actor: &str, points: i64, reason: &str) -> Result<()> {
        self.deltas
            .lock()
            .unwrap()
            .push((actor.to_string(), points, reason.to_string()));
        Ok(())
    }
}
