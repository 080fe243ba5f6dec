//! Core types for the column transition rule engine

mod action;
mod column;
mod condition;
mod gate;
mod history;
mod ids;
mod mapping;
mod task;
mod validation;

// Re-export all types
pub use action::{
    Action, ActionKind, ActionResult, Priority, StayPolicy, Trigger, DEFAULT_SCORE_POINTS,
};
pub use column::Column;
pub use condition::{Condition, Operator, ValueType};
pub use gate::OriginGate;
pub use history::ExecutionMarker;
pub use ids::{ActionId, ColumnId, EntityId, TaskId, ValidationId};
pub use mapping::{FieldMapping, MappingSource, Transform};
pub use task::{
    Checklist, ChecklistItem, DocumentLink, DocumentStatus, FieldValue, RelationshipLink, Task,
};
pub use validation::{
    Behavior, Validation, ValidationReport, ValidationResult, ValidationRule,
    MAX_ACTIVE_VALIDATIONS,
};
