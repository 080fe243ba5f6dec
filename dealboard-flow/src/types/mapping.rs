//! Field mapping types for entity-creation actions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a mapped value is read from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MappingSource {
    /// A named field on the task (the title is addressable as "title")
    TaskField { field: String },
    /// A board-level custom field, addressed by its id
    CustomField { custom_field_id: String },
    /// A constant configured on the mapping itself
    FixedValue { value: Value },
    /// A field of the acting user's profile
    UserField { field: String },
    /// A field of the owning project/board
    ProjectField { field: String },
}

/// String transforms applied after resolution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Uppercase,
    Lowercase,
    Capitalize,
    Trim,
    ExtractNumbers,
    FormatCpf,
    FormatCnpj,
    FormatPhone,
    FormatDate,
    FormatCurrency,
}

/// A declarative rule converting task data into one target entity field.
///
/// Mappings are keyed by `target_field`; an action's mapping list never
/// contains two entries for the same target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    #[serde(flatten)]
    pub source: MappingSource,
    pub target_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

impl FieldMapping {
    /// Map a task field straight through to a target field
    pub fn from_task_field(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: MappingSource::TaskField { field: field.into() },
            target_field: target.into(),
            transform: None,
            default_value: None,
            required: false,
        }
    }

    /// Map a fixed value to a target field
    pub fn fixed(value: Value, target: impl Into<String>) -> Self {
        Self {
            source: MappingSource::FixedValue { value },
            target_field: target.into(),
            transform: None,
            default_value: None,
            required: false,
        }
    }

    /// Apply a transform after resolution
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Fall back to this value when the source resolves to nothing
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Fail the owning action when no value resolves
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
