//! Condition types for custom-condition rules

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators, restricted per value type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Empty,
    NotEmpty,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    NotContains,
    In,
    NotIn,
}

impl Operator {
    /// Operators that compare without a configured operand
    pub fn requires_operand(&self) -> bool {
        !matches!(self, Self::Empty | Self::NotEmpty)
    }

    /// Whether this operator is permitted on a field of the given type.
    ///
    /// Presence checks are universal. Ordering needs a totally ordered type
    /// (numbers, dates). Substring/membership need text or lists.
    pub fn allowed_for(&self, value_type: ValueType) -> bool {
        use Operator::*;
        use ValueType::*;

        match self {
            Empty | NotEmpty => true,
            Equals | NotEquals => !matches!(value_type, Array),
            GreaterThan | LessThan | GreaterOrEqual | LessOrEqual => {
                matches!(value_type, Number | Date)
            }
            Contains | NotContains => matches!(value_type, String | Array),
            In | NotIn => matches!(value_type, String | Number),
        }
    }

    /// The wire name of this operator
    pub fn wire_name(&self) -> &'static str {
        use Operator::*;
        match self {
            Empty => "empty",
            NotEmpty => "not_empty",
            Equals => "equals",
            NotEquals => "not_equals",
            GreaterThan => "greater_than",
            LessThan => "less_than",
            GreaterOrEqual => "greater_or_equal",
            LessOrEqual => "less_or_equal",
            Contains => "contains",
            NotContains => "not_contains",
            In => "in",
            NotIn => "not_in",
        }
    }

    /// All operators, in the order clients present them
    pub fn all() -> &'static [Operator] {
        use Operator::*;
        &[
            Empty,
            NotEmpty,
            Equals,
            NotEquals,
            GreaterThan,
            LessThan,
            GreaterOrEqual,
            LessOrEqual,
            Contains,
            NotContains,
            In,
            NotIn,
        ]
    }
}

/// Canonical type of a condition's field and configured value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Number,
    Date,
    Boolean,
    Array,
}

impl ValueType {
    /// The wire name of this value type
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

/// A type-checked comparison of a task field against a configured value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Task field name to read
    pub field: String,
    pub operator: Operator,
    /// Configured operand; `Null` for presence operators
    #[serde(default)]
    pub value: Value,
    pub value_type: ValueType,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: Value,
        value_type: ValueType,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            value_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_operators_universal() {
        for vt in [
            ValueType::String,
            ValueType::Number,
            ValueType::Date,
            ValueType::Boolean,
            ValueType::Array,
        ] {
            assert!(Operator::Empty.allowed_for(vt));
            assert!(Operator::NotEmpty.allowed_for(vt));
        }
    }

    #[test]
    fn test_date_rejects_substring_operators() {
        assert!(!Operator::Contains.allowed_for(ValueType::Date));
        assert!(!Operator::NotContains.allowed_for(ValueType::Date));
        assert!(Operator::GreaterThan.allowed_for(ValueType::Date));
    }

    #[test]
    fn test_text_rejects_ordering_operators() {
        assert!(!Operator::GreaterThan.allowed_for(ValueType::String));
        assert!(!Operator::LessThan.allowed_for(ValueType::String));
        assert!(Operator::Contains.allowed_for(ValueType::String));
        assert!(Operator::In.allowed_for(ValueType::String));
    }

    #[test]
    fn test_operator_serde_names() {
        let json = serde_json::to_string(&Operator::GreaterOrEqual).unwrap();
        assert_eq!(json, "\"greater_or_equal\"");
        let op: Operator = serde_json::from_str("\"not_in\"").unwrap();
        assert_eq!(op, Operator::NotIn);
    }
}
