//! Condition evaluation
//!
//! Comparisons are type-aware: both the configured operand and the task's
//! field value are normalized to the condition's declared value type before
//! comparing. Normalization is idempotent - normalizing an already-normalized
//! value returns it unchanged - so stored values can be normalized again at
//! evaluation time without drift.

use crate::types::{Condition, FieldValue, Operator, ValueType};
use chrono::NaiveDate;
use serde_json::Value;

/// Outcome of evaluating one condition
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionOutcome {
    pub passed: bool,
    pub detail: String,
}

impl ConditionOutcome {
    fn pass(detail: impl Into<String>) -> Self {
        Self { passed: true, detail: detail.into() }
    }

    fn fail(detail: impl Into<String>) -> Self {
        Self { passed: false, detail: detail.into() }
    }
}

/// Normalize a JSON value to the canonical form of a value type.
///
/// Returns `None` when the value cannot represent the type (which callers
/// treat as "no comparable value", never as a panic).
///
/// - numbers accept locale-formatted strings: `"R$ 1.234,56"` -> `1234.56`
/// - dates canonicalize to `YYYY-MM-DD`, accepting `DD/MM/YYYY` and ISO
///   datetimes
/// - list operators coerce scalars to single-element arrays
pub fn normalize(value_type: ValueType, value: &Value) -> Option<Value> {
    match value_type {
        ValueType::String => match value {
            Value::String(s) => Some(Value::String(s.trim().to_string())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ValueType::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) => parse_locale_number(s).and_then(|n| {
                serde_json::Number::from_f64(n).map(Value::Number)
            }),
            _ => None,
        },
        ValueType::Date => match value {
            Value::String(s) => parse_date(s).map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
            _ => None,
        },
        ValueType::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        ValueType::Array => match value {
            Value::Array(_) => Some(value.clone()),
            Value::Null => None,
            scalar => Some(Value::Array(vec![scalar.clone()])),
        },
    }
}

/// Parse a number from a possibly locale-formatted string.
///
/// Accepts plain decimals (`1234.56`), Brazilian formatting with thousands
/// dots and a decimal comma (`1.234,56`), and leading currency markers.
pub(crate) fn parse_locale_number(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    if cleaned.contains(',') {
        // Comma is the decimal separator; dots are thousands markers
        let canonical = cleaned.replace('.', "").replace(',', ".");
        canonical.parse().ok()
    } else {
        cleaned.parse().ok()
    }
}

/// Parse a date from its accepted wire forms
pub(crate) fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%d/%m/%Y") {
        return Some(d);
    }
    // ISO datetimes: keep the date part
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    None
}

/// Evaluate a condition against a task field value.
///
/// Presence operators short-circuit on emptiness before any operand
/// handling; everything else normalizes both sides and compares.
pub fn evaluate(condition: &Condition, field: Option<&FieldValue>) -> ConditionOutcome {
    let is_empty = field.map(FieldValue::is_empty).unwrap_or(true);

    match condition.operator {
        Operator::Empty => {
            if is_empty {
                return ConditionOutcome::pass(format!("{} is empty", condition.field));
            }
            return ConditionOutcome::fail(format!("{} is not empty", condition.field));
        }
        Operator::NotEmpty => {
            if is_empty {
                return ConditionOutcome::fail(format!("{} is empty", condition.field));
            }
            return ConditionOutcome::pass(format!("{} is not empty", condition.field));
        }
        _ => {}
    }

    let Some(field_value) = field else {
        return ConditionOutcome::fail(format!("{} has no value", condition.field));
    };

    let Some(actual) = normalize(condition.value_type, &field_value.to_json()) else {
        return ConditionOutcome::fail(format!(
            "{} is not a valid {:?}",
            condition.field, condition.value_type
        ));
    };

    let expected_type = operand_type(condition.operator, condition.value_type);
    let Some(expected) = normalize(expected_type, &condition.value) else {
        return ConditionOutcome::fail(format!(
            "configured value is not a valid {:?}",
            expected_type
        ));
    };

    let passed = match condition.operator {
        Operator::Equals => values_equal(&actual, &expected),
        Operator::NotEquals => !values_equal(&actual, &expected),
        Operator::GreaterThan => compare(&actual, &expected, condition.value_type, |o| o > 0.0),
        Operator::LessThan => compare(&actual, &expected, condition.value_type, |o| o < 0.0),
        Operator::GreaterOrEqual => compare(&actual, &expected, condition.value_type, |o| o >= 0.0),
        Operator::LessOrEqual => compare(&actual, &expected, condition.value_type, |o| o <= 0.0),
        Operator::Contains => contains(&actual, &expected),
        Operator::NotContains => !contains(&actual, &expected),
        Operator::In => is_member(&actual, &expected, condition.value_type),
        Operator::NotIn => !is_member(&actual, &expected, condition.value_type),
        Operator::Empty | Operator::NotEmpty => unreachable!("handled above"),
    };

    let detail = format!(
        "{} {:?} {} (actual: {})",
        condition.field, condition.operator, expected, actual
    );
    if passed {
        ConditionOutcome::pass(detail)
    } else {
        ConditionOutcome::fail(detail)
    }
}

/// The type a configured operand normalizes to, given the operator.
///
/// List-membership operands coerce to arrays regardless of field type;
/// searching a list field for an element takes a scalar operand.
pub(crate) fn operand_type(operator: Operator, value_type: ValueType) -> ValueType {
    match operator {
        Operator::In | Operator::NotIn => ValueType::Array,
        Operator::Contains | Operator::NotContains if value_type == ValueType::Array => {
            ValueType::String
        }
        _ => value_type,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering comparison; ISO dates compare lexicographically
fn compare(actual: &Value, expected: &Value, value_type: ValueType, test: fn(f64) -> bool) -> bool {
    match value_type {
        ValueType::Number => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => test(a - e),
            _ => false,
        },
        ValueType::Date => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => test(match a.cmp(e) {
                std::cmp::Ordering::Less => -1.0,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Greater => 1.0,
            }),
            _ => false,
        },
        _ => false,
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(haystack) => expected
            .as_str()
            .map(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
        Value::Array(items) => items.iter().any(|item| match (item.as_str(), expected.as_str()) {
            (Some(i), Some(n)) => i.eq_ignore_ascii_case(n),
            _ => item == expected,
        }),
        _ => false,
    }
}

/// Scalar membership in the configured array, element-normalized to the
/// field's type
fn is_member(actual: &Value, expected_array: &Value, value_type: ValueType) -> bool {
    let Some(items) = expected_array.as_array() else {
        return false;
    };
    items
        .iter()
        .filter_map(|item| normalize(value_type, item))
        .any(|item| values_equal(actual, &item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cond(field: &str, op: Operator, value: Value, vt: ValueType) -> Condition {
        Condition::new(field, op, value, vt)
    }

    #[test]
    fn test_normalize_locale_numbers() {
        assert_eq!(
            normalize(ValueType::Number, &json!("1.234,56")),
            Some(json!(1234.56))
        );
        assert_eq!(
            normalize(ValueType::Number, &json!("R$ 350.000,00")),
            Some(json!(350000.0))
        );
        assert_eq!(normalize(ValueType::Number, &json!("42")), Some(json!(42.0)));
        assert_eq!(normalize(ValueType::Number, &json!("abc")), None);
    }

    #[test]
    fn test_normalize_dates() {
        assert_eq!(
            normalize(ValueType::Date, &json!("05/03/2026")),
            Some(json!("2026-03-05"))
        );
        assert_eq!(
            normalize(ValueType::Date, &json!("2026-03-05T14:30:00Z")),
            Some(json!("2026-03-05"))
        );
        assert_eq!(normalize(ValueType::Date, &json!("not a date")), None);
    }

    #[test]
    fn test_normalize_array_coercion() {
        assert_eq!(
            normalize(ValueType::Array, &json!("lead")),
            Some(json!(["lead"]))
        );
        assert_eq!(
            normalize(ValueType::Array, &json!(["a", "b"])),
            Some(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            (ValueType::Number, json!("1.234,56")),
            (ValueType::Number, json!(99.9)),
            (ValueType::Date, json!("31/12/2025")),
            (ValueType::Date, json!("2025-12-31")),
            (ValueType::String, json!("  padded  ")),
            (ValueType::Boolean, json!("1")),
            (ValueType::Array, json!("solo")),
            (ValueType::Array, json!([1, 2])),
        ];

        for (vt, value) in samples {
            let once = normalize(vt, &value).unwrap();
            let twice = normalize(vt, &once).unwrap();
            assert_eq!(once, twice, "normalize must be idempotent for {:?}", value);
        }
    }

    #[test]
    fn test_empty_operators_short_circuit() {
        let c = cond("phone", Operator::Empty, Value::Null, ValueType::String);
        assert!(evaluate(&c, None).passed);
        assert!(evaluate(&c, Some(&FieldValue::Text("  ".into()))).passed);
        assert!(!evaluate(&c, Some(&FieldValue::Text("119999".into()))).passed);

        let c = cond("phone", Operator::NotEmpty, Value::Null, ValueType::String);
        assert!(!evaluate(&c, None).passed);
        assert!(evaluate(&c, Some(&FieldValue::Text("119999".into()))).passed);
    }

    #[test]
    fn test_numeric_ordering_with_locale_operand() {
        let c = cond(
            "price",
            Operator::GreaterOrEqual,
            json!("300.000,00"),
            ValueType::Number,
        );
        assert!(evaluate(&c, Some(&FieldValue::Number(350000.0))).passed);
        assert!(!evaluate(&c, Some(&FieldValue::Number(250000.0))).passed);
    }

    #[test]
    fn test_date_ordering() {
        let c = cond(
            "visit_date",
            Operator::LessThan,
            json!("01/06/2026"),
            ValueType::Date,
        );
        let may = FieldValue::Date(NaiveDate::from_ymd_opt(2026, 5, 20).unwrap());
        let june = FieldValue::Date(NaiveDate::from_ymd_opt(2026, 6, 2).unwrap());
        assert!(evaluate(&c, Some(&may)).passed);
        assert!(!evaluate(&c, Some(&june)).passed);
    }

    #[test]
    fn test_text_contains_case_insensitive() {
        let c = cond("notes", Operator::Contains, json!("urgente"), ValueType::String);
        assert!(evaluate(&c, Some(&FieldValue::Text("Cliente URGENTE".into()))).passed);
        assert!(!evaluate(&c, Some(&FieldValue::Text("tranquilo".into()))).passed);
    }

    #[test]
    fn test_membership_coerces_scalar_operand() {
        // A scalar operand still works for `in`: it coerces to a one-element list
        let c = cond("status", Operator::In, json!("ativo"), ValueType::String);
        assert!(evaluate(&c, Some(&FieldValue::Text("ativo".into()))).passed);

        let c = cond(
            "status",
            Operator::In,
            json!(["ativo", "pendente"]),
            ValueType::String,
        );
        assert!(evaluate(&c, Some(&FieldValue::Text("pendente".into()))).passed);
        assert!(!evaluate(&c, Some(&FieldValue::Text("perdido".into()))).passed);

        let c = cond(
            "status",
            Operator::NotIn,
            json!(["perdido"]),
            ValueType::String,
        );
        assert!(evaluate(&c, Some(&FieldValue::Text("ativo".into()))).passed);
    }

    #[test]
    fn test_list_field_contains_element() {
        let tags = FieldValue::List(vec!["novo".into(), "Quente".into()]);

        let c = cond("tags", Operator::Contains, json!("quente"), ValueType::Array);
        assert!(evaluate(&c, Some(&tags)).passed);

        let c = cond("tags", Operator::NotContains, json!("frio"), ValueType::Array);
        assert!(evaluate(&c, Some(&tags)).passed);
    }

    #[test]
    fn test_numeric_membership() {
        let c = cond(
            "rooms",
            Operator::In,
            json!(["2", "3"]),
            ValueType::Number,
        );
        assert!(evaluate(&c, Some(&FieldValue::Number(3.0))).passed);
        assert!(!evaluate(&c, Some(&FieldValue::Number(5.0))).passed);
    }

    #[test]
    fn test_type_mismatch_fails_cleanly() {
        let c = cond("price", Operator::GreaterThan, json!(100), ValueType::Number);
        let outcome = evaluate(&c, Some(&FieldValue::Text("caro".into())));
        assert!(!outcome.passed);
        assert!(outcome.detail.contains("not a valid"));
    }

    #[test]
    fn test_missing_field_fails_comparison_operators() {
        let c = cond("price", Operator::Equals, json!(100), ValueType::Number);
        let outcome = evaluate(&c, None);
        assert!(!outcome.passed);
        assert!(outcome.detail.contains("no value"));
    }
}
