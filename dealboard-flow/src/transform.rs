//! Field mapping resolution and string transforms
//!
//! Entity-creation actions turn task data into payloads through declarative
//! mappings. Resolution order: configured source, then the mapping's
//! default. A transform that cannot apply (formatting a non-numeric string
//! as currency, say) degrades to the untransformed value; only a `required`
//! mapping with no resolvable value fails the owning action.

use crate::condition::{parse_date, parse_locale_number};
use crate::error::{FlowError, Result};
use crate::types::{FieldMapping, FieldValue, MappingSource, Task, Transform};
use indexmap::IndexMap;
use serde_json::Value;

/// Caller-supplied context for user/project/custom field sources.
///
/// User and project resolution live outside the engine; callers hand the
/// relevant field values in with the move.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MappingContext {
    #[serde(default)]
    pub user_fields: IndexMap<String, FieldValue>,
    #[serde(default)]
    pub project_fields: IndexMap<String, FieldValue>,
    /// Board-level custom field values for the task, keyed by field id
    #[serde(default)]
    pub custom_fields: IndexMap<String, FieldValue>,
}

/// Resolve one mapping to its target value.
///
/// `Ok(None)` means "no value, and that is fine" (optional mapping);
/// a required mapping with no value is an error.
pub fn resolve_mapping(
    mapping: &FieldMapping,
    task: &Task,
    ctx: &MappingContext,
) -> Result<Option<Value>> {
    let source_value: Option<Value> = match &mapping.source {
        MappingSource::TaskField { field } => task
            .field(field)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_json()),
        MappingSource::CustomField { custom_field_id } => ctx
            .custom_fields
            .get(custom_field_id)
            .filter(|v| !v.is_empty())
            .map(FieldValue::to_json),
        MappingSource::FixedValue { value } => {
            if value.is_null() {
                None
            } else {
                Some(value.clone())
            }
        }
        MappingSource::UserField { field } => ctx
            .user_fields
            .get(field)
            .filter(|v| !v.is_empty())
            .map(FieldValue::to_json),
        MappingSource::ProjectField { field } => ctx
            .project_fields
            .get(field)
            .filter(|v| !v.is_empty())
            .map(FieldValue::to_json),
    };

    let value = source_value.or_else(|| mapping.default_value.clone());

    let Some(value) = value else {
        if mapping.required {
            return Err(FlowError::MissingRequiredField {
                target: mapping.target_field.clone(),
            });
        }
        return Ok(None);
    };

    match mapping.transform {
        Some(transform) => {
            let text = match &value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Ok(Some(Value::String(apply_transform(transform, &text))))
        }
        None => Ok(Some(value)),
    }
}

/// Build the payload object for an entity-creation action
pub fn build_payload(
    mappings: &[FieldMapping],
    task: &Task,
    ctx: &MappingContext,
) -> Result<Value> {
    let mut payload = serde_json::Map::new();
    for mapping in mappings {
        if let Some(value) = resolve_mapping(mapping, task, ctx)? {
            payload.insert(mapping.target_field.clone(), value);
        }
    }
    Ok(Value::Object(payload))
}

/// Apply a string transform; unapplicable transforms return the input
pub fn apply_transform(transform: Transform, input: &str) -> String {
    match transform {
        Transform::Uppercase => input.to_uppercase(),
        Transform::Lowercase => input.to_lowercase(),
        Transform::Capitalize => title_case(input),
        Transform::Trim => input.trim().to_string(),
        Transform::ExtractNumbers => extract_digits(input),
        Transform::FormatCpf => format_with_mask(input, "###.###.###-##", 11),
        Transform::FormatCnpj => format_with_mask(input, "##.###.###/####-##", 14),
        Transform::FormatPhone => format_phone(input),
        Transform::FormatDate => match parse_date(input) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => input.to_string(),
        },
        Transform::FormatCurrency => match parse_locale_number(input) {
            Some(number) => format_brl(number),
            None => input.to_string(),
        },
    }
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Apply a `#` mask over the digit-extracted input; wrong digit counts
/// pass the input through untouched
fn format_with_mask(input: &str, mask: &str, expected_digits: usize) -> String {
    let digits = extract_digits(input);
    if digits.len() != expected_digits {
        return input.to_string();
    }

    let mut out = String::with_capacity(mask.len());
    let mut digit_chars = digits.chars();
    for mask_char in mask.chars() {
        if mask_char == '#' {
            // Mask length matches expected_digits
            out.push(digit_chars.next().unwrap_or('0'));
        } else {
            out.push(mask_char);
        }
    }
    out
}

fn format_phone(input: &str) -> String {
    let digits = extract_digits(input);
    match digits.len() {
        11 => format_with_mask(&digits, "(##) #####-####", 11),
        10 => format_with_mask(&digits, "(##) ####-####", 10),
        _ => input.to_string(),
    }
}

/// Format a number as Brazilian currency: `R$ 1.234,56`
fn format_brl(number: f64) -> String {
    let negative = number < 0.0;
    let cents = (number.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, frac)
}
