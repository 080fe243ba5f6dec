//! FlowContext - I/O primitives for rule storage
//!
//! The context provides access to storage and collaborators. No business
//! logic methods, just data access primitives. Commands do all the work.
//!
//! Rules are stored file-per-entity as JSON under the `.dealboard` root;
//! each rule also owns an append-only JSONL history log. Execution markers
//! (idempotency + periodic counters) live one file per `(action, task)`
//! pair. Tasks and columns are never stored here - they are read through
//! the [`TaskStore`] collaborator.

use crate::collab::{
    EntityService, MemoryEntityService, MemoryMessenger, MemoryScoreLedger, MemoryTaskStore,
    Messenger, ScoreLedger, TaskStore,
};
use crate::error::{FlowError, Result};
use crate::types::{Action, ActionId, ColumnId, ExecutionMarker, TaskId, Validation, ValidationId};
use dealboard_operations::LogEntry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// External services the engine delegates side effects to
#[derive(Clone)]
pub struct Collaborators {
    pub tasks: Arc<dyn TaskStore>,
    pub entities: Arc<dyn EntityService>,
    pub messenger: Arc<dyn Messenger>,
    pub scores: Arc<dyn ScoreLedger>,
}

/// Handles onto the in-memory collaborators, for inspection in tests
pub struct MemoryCollaborators {
    pub tasks: Arc<MemoryTaskStore>,
    pub entities: Arc<MemoryEntityService>,
    pub messenger: Arc<MemoryMessenger>,
    pub scores: Arc<MemoryScoreLedger>,
}

impl MemoryCollaborators {
    /// Fresh in-memory collaborators
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(MemoryTaskStore::new()),
            entities: Arc::new(MemoryEntityService::new()),
            messenger: Arc::new(MemoryMessenger::new()),
            scores: Arc::new(MemoryScoreLedger::new()),
        }
    }

    /// Erase the concrete types for wiring into a context
    pub fn as_collaborators(&self) -> Collaborators {
        Collaborators {
            tasks: self.tasks.clone(),
            entities: self.entities.clone(),
            messenger: self.messenger.clone(),
            scores: self.scores.clone(),
        }
    }
}

impl Default for MemoryCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

/// Context passed to every command - provides access, not logic
pub struct FlowContext {
    /// Path to the .dealboard directory
    root: PathBuf,
    /// External services
    pub collab: Collaborators,
}

impl FlowContext {
    /// Create a new context for the given .dealboard directory
    pub fn new(root: impl Into<PathBuf>, collab: Collaborators) -> Self {
        Self {
            root: root.into(),
            collab,
        }
    }

    /// Create a context wired to fresh in-memory collaborators,
    /// returning the handles for inspection
    pub fn with_memory(root: impl Into<PathBuf>) -> (Self, MemoryCollaborators) {
        let memory = MemoryCollaborators::new();
        let ctx = Self::new(root, memory.as_collaborators());
        (ctx, memory)
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    /// Get the root .dealboard directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to validations directory
    pub fn validations_dir(&self) -> PathBuf {
        self.root.join("validations")
    }

    /// Path to a validation's JSON file
    pub fn validation_path(&self, id: &ValidationId) -> PathBuf {
        self.validations_dir().join(format!("{}.json", id))
    }

    /// Path to actions directory
    pub fn actions_dir(&self) -> PathBuf {
        self.root.join("actions")
    }

    /// Path to an action's JSON file
    pub fn action_path(&self, id: &ActionId) -> PathBuf {
        self.actions_dir().join(format!("{}.json", id))
    }

    /// Path to execution markers directory
    pub fn executions_dir(&self) -> PathBuf {
        self.root.join("executions")
    }

    /// Path to the marker for one (action, task) pair
    pub fn marker_path(&self, action: &ActionId, task: &TaskId) -> PathBuf {
        self.executions_dir().join(format!("{}__{}.json", action, task))
    }

    /// Path to rule history directory
    pub fn history_dir(&self) -> PathBuf {
        self.root.join("history")
    }

    /// Path to a rule's JSONL history log
    pub fn history_path(&self, rule_id: &str) -> PathBuf {
        self.history_dir().join(format!("{}.jsonl", rule_id))
    }

    /// Ensure the directory structure exists; idempotent and fast when
    /// directories are already present
    pub async fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.validations_dir()).await?;
        fs::create_dir_all(self.actions_dir()).await?;
        fs::create_dir_all(self.executions_dir()).await?;
        fs::create_dir_all(self.history_dir()).await?;
        Ok(())
    }

    // =========================================================================
    // Validation I/O
    // =========================================================================

    /// Read a validation file
    pub async fn read_validation(&self, id: &ValidationId) -> Result<Validation> {
        let path = self.validation_path(id);
        if !path.exists() {
            return Err(FlowError::ValidationNotFound { id: id.to_string() });
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a validation file (atomic write via temp file)
    pub async fn write_validation(&self, validation: &Validation) -> Result<()> {
        self.ensure_directories().await?;
        let path = self.validation_path(&validation.id);
        let content = serde_json::to_string_pretty(validation)?;
        atomic_write(&path, content.as_bytes()).await
    }

    /// Delete a validation file
    pub async fn delete_validation_file(&self, id: &ValidationId) -> Result<()> {
        let path = self.validation_path(id);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    /// Read all validations
    pub async fn read_all_validations(&self) -> Result<Vec<Validation>> {
        let mut validations = Vec::new();
        for content in read_dir_json(&self.validations_dir()).await? {
            validations.push(serde_json::from_str(&content)?);
        }
        Ok(validations)
    }

    /// Validations attached to one column, ascending by `order`
    pub async fn column_validations(
        &self,
        column_id: &ColumnId,
        include_inactive: bool,
    ) -> Result<Vec<Validation>> {
        let mut validations: Vec<Validation> = self
            .read_all_validations()
            .await?
            .into_iter()
            .filter(|v| &v.column_id == column_id && (include_inactive || v.is_active))
            .collect();
        validations.sort_by_key(|v| v.order);
        Ok(validations)
    }

    // =========================================================================
    // Action I/O
    // =========================================================================

    /// Read an action file
    pub async fn read_action(&self, id: &ActionId) -> Result<Action> {
        let path = self.action_path(id);
        if !path.exists() {
            return Err(FlowError::ActionNotFound { id: id.to_string() });
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write an action file (atomic write via temp file)
    pub async fn write_action(&self, action: &Action) -> Result<()> {
        self.ensure_directories().await?;
        let path = self.action_path(&action.id);
        let content = serde_json::to_string_pretty(action)?;
        atomic_write(&path, content.as_bytes()).await
    }

    /// Delete an action file
    pub async fn delete_action_file(&self, id: &ActionId) -> Result<()> {
        let path = self.action_path(id);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    /// Read all actions
    pub async fn read_all_actions(&self) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        for content in read_dir_json(&self.actions_dir()).await? {
            actions.push(serde_json::from_str(&content)?);
        }
        Ok(actions)
    }

    /// Actions attached to one column, ascending by `order`
    pub async fn column_actions(
        &self,
        column_id: &ColumnId,
        include_inactive: bool,
    ) -> Result<Vec<Action>> {
        let mut actions: Vec<Action> = self
            .read_all_actions()
            .await?
            .into_iter()
            .filter(|a| &a.column_id == column_id && (include_inactive || a.is_active))
            .collect();
        actions.sort_by_key(|a| a.order);
        Ok(actions)
    }

    // =========================================================================
    // Execution markers
    // =========================================================================

    /// Read the marker for a pair, defaulting to a never-executed marker
    pub async fn read_marker(&self, action: &ActionId, task: &TaskId) -> Result<ExecutionMarker> {
        let path = self.marker_path(action, task);
        if !path.exists() {
            return Ok(ExecutionMarker::new(action.clone(), task.clone()));
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a marker (atomic write via temp file)
    pub async fn write_marker(&self, marker: &ExecutionMarker) -> Result<()> {
        self.ensure_directories().await?;
        let path = self.marker_path(&marker.action_id, &marker.task_id);
        let content = serde_json::to_string_pretty(marker)?;
        atomic_write(&path, content.as_bytes()).await
    }

    // =========================================================================
    // Rule history
    // =========================================================================

    /// Append an entry to a rule's history log
    pub async fn append_history(&self, rule_id: &str, entry: &LogEntry) -> Result<()> {
        self.ensure_directories().await?;
        let path = self.history_path(rule_id);
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read a rule's history, newest first; missing log means no history
    pub async fn read_history(&self, rule_id: &str) -> Result<Vec<LogEntry>> {
        let path = self.history_path(rule_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(line)?);
        }
        entries.reverse();
        Ok(entries)
    }

    /// Whether a rule has ever been run against a task.
    ///
    /// CRUD entries in the same log do not count; only run entries force
    /// soft-deletion for audit retention.
    pub async fn history_has_runs(&self, rule_id: &str) -> Result<bool> {
        let entries = self.read_history(rule_id).await?;
        Ok(entries.iter().any(|e| e.op.starts_with("run ")))
    }
}

/// Write a file atomically: write to a temp sibling, then rename over
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read the contents of every `.json` file in a directory
async fn read_dir_json(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut contents = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            contents.push(fs::read_to_string(&path).await?);
        }
    }
    Ok(contents)
}
