//! Validation engine
//!
//! Checks a record against its field schema and produces human-readable
//! violation messages. Violations follow schema definition order. The engine
//! never mutates its input; callers must refuse to persist a record whose
//! violation list is non-empty.

use serde_json::Value;

use crate::schema::{FieldFormat, FieldSchema};
use crate::types::Record;

/// Validate a record against a field schema.
///
/// Returns one message per violation, in schema definition order:
/// - required fields that are absent, null, or empty strings
/// - number fields below their `min` or above their `max`
///
/// Object fields with a nested schema are validated recursively against the
/// embedded value.
pub fn validate(record: &Record, schema: &FieldSchema) -> Vec<String> {
    let mut violations = Vec::new();

    for (key, definition) in schema.iter() {
        let value = record.get(key);

        if definition.required && is_missing(value) {
            violations.push(format!("The field '{}' is required.", definition.label));
        }

        if definition.format == FieldFormat::Number {
            if let Some(n) = value.and_then(Value::as_f64) {
                if let Some(min) = definition.min {
                    if n < min {
                        violations.push(format!(
                            "The value for '{}' should not be less than {}.",
                            definition.label, min
                        ));
                    }
                }
                if let Some(max) = definition.max {
                    if n > max {
                        violations.push(format!(
                            "The value for '{}' should not exceed {}.",
                            definition.label, max
                        ));
                    }
                }
            }
        }

        if let Some(nested) = definition.nested.as_deref() {
            if let Some(Value::Object(embedded)) = value {
                violations.extend(validate(embedded, nested));
            }
        }
    }

    violations
}

/// Validate and collapse violations into a single error message, the form
/// the store adapters raise
pub fn validate_or_message(record: &Record, schema: &FieldSchema) -> Result<(), String> {
    let violations = validate(record, schema);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations.join(" "))
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDefinition;
    use serde_json::json;

    fn schema() -> FieldSchema {
        FieldSchema::new()
            .with(
                "approved_symbol",
                FieldDefinition {
                    label: "Approved Symbol".into(),
                    required: true,
                    ..Default::default()
                },
            )
            .with(
                "evidence_count",
                FieldDefinition {
                    label: "Evidence Count".into(),
                    format: FieldFormat::Number,
                    min: Some(0.0),
                    max: Some(100.0),
                    ..Default::default()
                },
            )
    }

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_record_yields_no_violations() {
        let rec = record(&[
            ("approved_symbol", json!("PKD1")),
            ("evidence_count", json!(42)),
        ]);
        assert!(validate(&rec, &schema()).is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let rec = record(&[("evidence_count", json!(1))]);
        assert_eq!(
            validate(&rec, &schema()),
            vec!["The field 'Approved Symbol' is required."]
        );
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let rec = record(&[("approved_symbol", json!(""))]);
        let violations = validate(&rec, &schema());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("required"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let rec = record(&[("approved_symbol", serde_json::Value::Null)]);
        assert_eq!(validate(&rec, &schema()).len(), 1);
    }

    #[test]
    fn test_number_below_min() {
        let rec = record(&[
            ("approved_symbol", json!("PKD1")),
            ("evidence_count", json!(-3)),
        ]);
        assert_eq!(
            validate(&rec, &schema()),
            vec!["The value for 'Evidence Count' should not be less than 0."]
        );
    }

    #[test]
    fn test_number_above_max() {
        let rec = record(&[
            ("approved_symbol", json!("PKD1")),
            ("evidence_count", json!(101)),
        ]);
        assert_eq!(
            validate(&rec, &schema()),
            vec!["The value for 'Evidence Count' should not exceed 100."]
        );
    }

    #[test]
    fn test_absent_number_is_not_range_checked() {
        let rec = record(&[("approved_symbol", json!("PKD1"))]);
        assert!(validate(&rec, &schema()).is_empty());
    }

    #[test]
    fn test_violation_order_follows_schema_order() {
        let rec = record(&[("evidence_count", json!(-1))]);
        let violations = validate(&rec, &schema());
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("Approved Symbol"));
        assert!(violations[1].contains("Evidence Count"));
    }

    #[test]
    fn test_nested_schema_validated_recursively() {
        let nested = FieldSchema::new().with(
            "variants",
            FieldDefinition {
                label: "Variants".into(),
                format: FieldFormat::Number,
                min: Some(0.0),
                ..Default::default()
            },
        );
        let schema = FieldSchema::new().with(
            "points",
            FieldDefinition {
                label: "Points".into(),
                format: FieldFormat::Object,
                nested: Some(Box::new(nested)),
                ..Default::default()
            },
        );

        let rec = record(&[("points", json!({ "variants": -2 }))]);
        assert_eq!(
            validate(&rec, &schema),
            vec!["The value for 'Variants' should not be less than 0."]
        );
    }

    #[test]
    fn test_does_not_mutate_input() {
        let rec = record(&[("evidence_count", json!(-1))]);
        let before = rec.clone();
        let _ = validate(&rec, &schema());
        assert_eq!(rec, before);
    }

    #[test]
    fn test_joined_message_form() {
        let rec = record(&[("evidence_count", json!(-1))]);
        let err = validate_or_message(&rec, &schema()).unwrap_err();
        assert_eq!(
            err,
            "The field 'Approved Symbol' is required. \
             The value for 'Evidence Count' should not be less than 0."
        );
    }
}
