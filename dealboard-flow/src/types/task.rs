//! Task snapshot types consumed from the external task store

use super::ids::{ColumnId, EntityId, TaskId};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single task field value.
///
/// Untagged: JSON scalars deserialize into the most specific variant that
/// accepts them (a `YYYY-MM-DD` string becomes `Date`, anything else `Text`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Whether this value counts as empty for required-field checks
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Number(_) | Self::Date(_) => false,
        }
    }

    /// Convert to a JSON value for comparison and payload building
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Render as a plain string (used by templates and transforms)
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Lifecycle status of a linked document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Pending,
    Signed,
    Approved,
    Rejected,
}

impl DocumentStatus {
    /// Statuses that satisfy a required-document rule when no explicit
    /// status is configured
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Signed | Self::Approved)
    }
}

/// A document linked to a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentLink {
    pub document_type: String,
    pub status: DocumentStatus,
}

/// A relationship from a task to another entity (client, property, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipLink {
    pub kind: String,
    pub entity_id: EntityId,
}

/// One checklist item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub done: bool,
}

/// A named checklist attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checklist {
    pub id: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// True when every item is done (an empty checklist is complete)
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|i| i.done)
    }
}

/// The task snapshot the engine evaluates rules against.
///
/// The engine never owns tasks; this is the read model served by the
/// external task store for a single move or scheduler tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub column: ColumnId,
    #[serde(default)]
    pub position: usize,
    /// Actor whose score ledger receives point deltas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
    #[serde(default)]
    pub documents: Vec<DocumentLink>,
    #[serde(default)]
    pub relationships: Vec<RelationshipLink>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

impl Task {
    /// Create a task snapshot with a title and column
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, column: impl Into<ColumnId>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            column: column.into(),
            position: 0,
            owner: None,
            fields: IndexMap::new(),
            documents: Vec::new(),
            relationships: Vec::new(),
            checklists: Vec::new(),
        }
    }

    /// Set a field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Look up a field value by name; the task title is addressable as "title"
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        if name == "title" {
            return Some(FieldValue::Text(self.title.clone()));
        }
        self.fields.get(name).cloned()
    }

    /// Find a checklist by id
    pub fn find_checklist(&self, id: &str) -> Option<&Checklist> {
        self.checklists.iter().find(|c| c.id == id)
    }
}
