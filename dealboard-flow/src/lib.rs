//! Column transition rule engine with file-backed rule storage
//!
//! This crate powers the automation layer of a kanban pipeline: per-column
//! validation rules that block or warn a task's move, and automated actions
//! fired when tasks enter, leave, or stay in a column. Rules are stored as
//! JSON files in a `.dealboard` directory; tasks, columns, and every side
//! effect live behind narrow collaborator traits.
//!
//! ## Overview
//!
//! - **Validations** - up to three active rules per column decide whether a
//!   task may enter (required fields, documents, relationships, checklists,
//!   or type-checked custom conditions)
//! - **Actions** - ordered side effects per trigger: entity creation from
//!   field mappings, task mutation, messaging, score updates
//! - **Move orchestration** - one state machine runs validations, commits
//!   the move, then fires origin on_exit and destination on_enter actions
//! - **Stay scheduling** - a background loop re-fires on_stay actions on
//!   their configured interval with per-pair serialization
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use dealboard_flow::{
//!     task::MoveTask, validation::AddValidation, Behavior, Execute, FlowContext,
//!     ValidationRule,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (ctx, _memory) = FlowContext::with_memory("/path/to/.dealboard");
//!
//! // Guard a column
//! AddValidation::new(
//!     "proposta",
//!     ValidationRule::RequiredField { field: "client".into() },
//!     Behavior::Block,
//!     "Vincule um cliente antes de avançar",
//! )
//! .execute(&ctx)
//! .await?;
//!
//! // Move a task through the rules
//! let outcome = MoveTask::new("task-1", "visita", "proposta")
//!     .execute(&ctx)
//!     .await?;
//! println!("blocked: {}", outcome["blocked"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! ```text
//! .dealboard/
//! ├── validations/
//! │   └── {id}.json        # Validation rule state
//! ├── actions/
//! │   └── {id}.json        # Action state
//! ├── executions/
//! │   └── {action}__{task}.json   # Idempotency + periodic counters
//! └── history/
//!     └── {rule}.jsonl     # Per-rule append-only audit log
//! ```
//!
//! Entity state files use JSON; history logs use JSONL (one entry per line).

pub mod collab;
pub mod condition;
mod context;
mod error;
pub mod scheduler;
pub mod transform;
pub mod types;

// Command modules
pub mod action;
pub mod task;
pub mod validation;

// Re-export Execute trait and types from the operations crate
pub use dealboard_operations::{async_trait, operation, Execute, LogEntry, Operation};

pub use context::{Collaborators, FlowContext, MemoryCollaborators};
pub use error::{FlowError, Result};

// Re-export commonly used types
pub use types::{
    Action, ActionId, ActionKind, ActionResult, Behavior, Column, ColumnId, Condition, EntityId,
    ExecutionMarker, FieldMapping, FieldValue, Operator, OriginGate, StayPolicy, Task, TaskId,
    Transform, Trigger, Validation, ValidationId, ValidationReport, ValidationResult,
    ValidationRule, ValueType,
};
