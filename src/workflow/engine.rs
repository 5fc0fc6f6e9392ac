//! Workflow engine
//!
//! Applies prefill mappings when seeding a downstream record and evaluates
//! threshold decision rules. Manual-override tracking lives in an explicit
//! `DecisionState` owned by the caller (one per open form/session); it is
//! not persisted with the record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::types::Record;
use crate::workflow::config::{StageConfig, WorkflowConfig};

/// Audit note appended to the comment field when a curator changes a
/// decision away from its computed value
pub const MANUAL_OVERRIDE_NOTE: &str = "Decision manually overridden.";

/// Per-form decision-rule state: which decision fields are currently
/// auto-filled and which the user has overridden
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionState {
    #[serde(default)]
    auto_set: BTreeSet<String>,
    #[serde(default)]
    overridden: BTreeSet<String>,
}

impl DecisionState {
    pub fn is_auto_set(&self, field: &str) -> bool {
        self.auto_set.contains(field)
    }

    pub fn is_overridden(&self, field: &str) -> bool {
        self.overridden.contains(field)
    }
}

/// Seed a partial record for `target_stage` by copying mapped fields from a
/// source record. Fields not covered by any rule remain unset. Applying the
/// same rules to the same source twice yields the same result.
pub fn apply_prefill(config: &WorkflowConfig, source: &Record, target_stage: &str) -> Record {
    let mut result = Record::new();

    for rule in config.prefill_rules_for(target_stage) {
        for mapping in &rule.fields {
            if let Some(value) = source.get(&mapping.source_field) {
                result.insert(mapping.target_field.clone(), value.clone());
            }
        }
    }

    result
}

/// Evaluate a stage's decision rules against a record.
///
/// For each rule, the truthy condition fields are counted; when the count
/// meets the threshold and the decision field has not been manually
/// overridden (or already set to a different value), the field is set to the
/// rule's decision and marked auto-set. When the count drops below the
/// threshold the auto-set mark is cleared but the value is left in place.
/// Rules are evaluated in declaration order; the first rule to claim a field
/// wins.
pub fn evaluate_decision_rules(
    stage: &StageConfig,
    record: &Record,
    state: &mut DecisionState,
) -> Record {
    let mut result = record.clone();

    for rule in &stage.decision_rules {
        let count = rule
            .conditions
            .iter()
            .filter(|c| is_truthy(result.get(c.as_str())))
            .count();

        if count >= rule.threshold {
            if state.overridden.contains(&rule.field) {
                continue;
            }
            // A decision already set to a different value is a manual choice
            let current = result.get(&rule.field).and_then(Value::as_str);
            if matches!(current, Some(v) if !v.is_empty() && v != rule.decision) {
                continue;
            }

            result.insert(rule.field.clone(), Value::String(rule.decision.clone()));
            state.auto_set.insert(rule.field.clone());
            state.overridden.remove(&rule.field);
        } else if state.auto_set.contains(&rule.field) {
            state.auto_set.remove(&rule.field);
        }
    }

    result
}

/// Record a user edit to a decision field.
///
/// Compares the new value against the value the rules would compute. A
/// mismatch marks the field overridden (stopping auto-updates) and appends
/// the audit note to the record's comment field; a match clears the
/// override and removes the note.
pub fn register_decision_change(
    stage: &StageConfig,
    record: &Record,
    field: &str,
    state: &mut DecisionState,
) -> Record {
    let mut result = record.clone();

    let computed = stage
        .decision_rules
        .iter()
        .filter(|r| r.field == field)
        .find(|r| {
            let count = r
                .conditions
                .iter()
                .filter(|c| is_truthy(result.get(c.as_str())))
                .count();
            count >= r.threshold
        })
        .map(|r| r.decision.as_str())
        .unwrap_or("");

    let current = result
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    if current != computed {
        state.overridden.insert(field.to_string());
        state.auto_set.remove(field);
        append_comment_note(&mut result, MANUAL_OVERRIDE_NOTE);
    } else {
        state.overridden.remove(field);
        remove_comment_note(&mut result, MANUAL_OVERRIDE_NOTE);
    }

    result
}

/// JavaScript-style truthiness, matching how condition fields were counted
/// in the original form logic
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn append_comment_note(record: &mut Record, note: &str) {
    let comment = record
        .get("comment")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    if comment.contains(note) {
        return;
    }

    let updated = if comment.is_empty() {
        note.to_string()
    } else {
        format!("{comment} {note}")
    };
    record.insert("comment".to_string(), Value::String(updated));
}

fn remove_comment_note(record: &mut Record, note: &str) {
    let Some(comment) = record.get("comment").and_then(Value::as_str) else {
        return;
    };

    if !comment.contains(note) {
        return;
    }

    let cleaned = comment
        .replace(note, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    record.insert("comment".to_string(), Value::String(cleaned));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::kidney_genetics_workflow;
    use crate::workflow::config::{DecisionRule, WorkflowConfig};
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn precuration_stage(workflow: &WorkflowConfig) -> &StageConfig {
        workflow.get_stage("precuration").unwrap()
    }

    #[test]
    fn test_prefill_copies_mapped_fields_only() {
        let workflow = kidney_genetics_workflow();
        let gene = record(&[
            ("approved_symbol", json!("PKD1")),
            ("hgnc_id", json!("HGNC:9008")),
            ("evidence_count", json!(17)),
        ]);

        let seeded = apply_prefill(&workflow, &gene, "precuration");
        assert_eq!(seeded.get("approved_symbol"), Some(&json!("PKD1")));
        assert_eq!(seeded.get("hgnc_id"), Some(&json!("HGNC:9008")));
        assert!(seeded.get("evidence_count").is_none());
    }

    #[test]
    fn test_prefill_is_idempotent() {
        let workflow = kidney_genetics_workflow();
        let gene = record(&[
            ("approved_symbol", json!("PKD1")),
            ("hgnc_id", json!("HGNC:9008")),
        ]);

        let once = apply_prefill(&workflow, &gene, "precuration");
        let twice = apply_prefill(&workflow, &gene, "precuration");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_prefill_skips_absent_source_fields() {
        let workflow = kidney_genetics_workflow();
        let gene = record(&[("approved_symbol", json!("PKD1"))]);

        let seeded = apply_prefill(&workflow, &gene, "precuration");
        assert!(seeded.get("hgnc_id").is_none());
    }

    #[test]
    fn test_two_truthy_conditions_meet_threshold() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
            ("mechanism_difference", json!(false)),
            ("phenotypic_variability", json!(false)),
        ]);

        let result = evaluate_decision_rules(stage, &rec, &mut state);
        assert_eq!(result.get("decision"), Some(&json!("Split")));
        assert!(state.is_auto_set("decision"));
    }

    #[test]
    fn test_one_truthy_condition_leaves_decision_unset() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(false)),
        ]);

        let result = evaluate_decision_rules(stage, &rec, &mut state);
        assert!(result.get("decision").is_none());
        assert!(!state.is_auto_set("decision"));
    }

    #[test]
    fn test_any_two_of_four_conditions_suffice() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let conditions = [
            "entity_assertion",
            "inheritance_difference",
            "mechanism_difference",
            "phenotypic_variability",
        ];

        for i in 0..conditions.len() {
            for j in (i + 1)..conditions.len() {
                let mut state = DecisionState::default();
                let rec = record(&[
                    (conditions[i], json!(true)),
                    (conditions[j], json!(true)),
                ]);
                let result = evaluate_decision_rules(stage, &rec, &mut state);
                assert_eq!(
                    result.get("decision"),
                    Some(&json!("Split")),
                    "pair ({}, {})",
                    conditions[i],
                    conditions[j]
                );
            }
        }
    }

    #[test]
    fn test_manual_value_is_not_overwritten() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
            ("decision", json!("Lump")),
        ]);

        let result = evaluate_decision_rules(stage, &rec, &mut state);
        assert_eq!(result.get("decision"), Some(&json!("Lump")));
        assert!(!state.is_auto_set("decision"));
    }

    #[test]
    fn test_dropping_below_threshold_clears_auto_mark_but_keeps_value() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
        ]);
        let filled = evaluate_decision_rules(stage, &rec, &mut state);
        assert!(state.is_auto_set("decision"));

        let mut fewer = filled.clone();
        fewer.insert("inheritance_difference".to_string(), json!(false));
        let result = evaluate_decision_rules(stage, &fewer, &mut state);

        assert!(!state.is_auto_set("decision"));
        assert_eq!(result.get("decision"), Some(&json!("Split")));
    }

    #[test]
    fn test_override_appends_audit_note_and_stops_auto_updates() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
        ]);
        let mut filled = evaluate_decision_rules(stage, &rec, &mut state);

        // Curator switches the decision away from the computed value
        filled.insert("decision".to_string(), json!("Lump"));
        let noted = register_decision_change(stage, &filled, "decision", &mut state);

        assert!(state.is_overridden("decision"));
        assert_eq!(
            noted.get("comment"),
            Some(&json!(MANUAL_OVERRIDE_NOTE))
        );

        // Rules no longer touch the overridden field
        let after = evaluate_decision_rules(stage, &noted, &mut state);
        assert_eq!(after.get("decision"), Some(&json!("Lump")));
    }

    #[test]
    fn test_restoring_computed_value_clears_override_and_note() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
            ("comment", json!("Looks clear.")),
        ]);
        let mut filled = evaluate_decision_rules(stage, &rec, &mut state);

        filled.insert("decision".to_string(), json!("Lump"));
        let noted = register_decision_change(stage, &filled, "decision", &mut state);
        assert_eq!(
            noted.get("comment"),
            Some(&json!(format!("Looks clear. {MANUAL_OVERRIDE_NOTE}")))
        );

        let mut restored = noted.clone();
        restored.insert("decision".to_string(), json!("Split"));
        let cleared = register_decision_change(stage, &restored, "decision", &mut state);

        assert!(!state.is_overridden("decision"));
        assert_eq!(cleared.get("comment"), Some(&json!("Looks clear.")));
    }

    #[test]
    fn test_audit_note_is_not_duplicated() {
        let workflow = kidney_genetics_workflow();
        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
            ("decision", json!("Lump")),
        ]);

        let once = register_decision_change(stage, &rec, "decision", &mut state);
        let twice = register_decision_change(stage, &once, "decision", &mut state);
        assert_eq!(once.get("comment"), twice.get("comment"));
    }

    #[test]
    fn test_first_matching_rule_wins_for_a_field() {
        let mut workflow = kidney_genetics_workflow();
        workflow.stages[1].decision_rules.push(DecisionRule {
            field: "decision".to_string(),
            conditions: vec!["entity_assertion".to_string()],
            decision: "Lump".to_string(),
            threshold: 1,
        });
        let stage = workflow.get_stage("precuration").unwrap();
        let mut state = DecisionState::default();

        let rec = record(&[
            ("entity_assertion", json!(true)),
            ("inheritance_difference", json!(true)),
        ]);

        let result = evaluate_decision_rules(stage, &rec, &mut state);
        assert_eq!(result.get("decision"), Some(&json!("Split")));
    }

    #[test]
    fn test_end_to_end_precuration_decision() {
        // Gene PKD1 seeds a precuration; two truthy assessments under the
        // built-in rule set select Split without the curator touching it.
        let workflow = kidney_genetics_workflow();
        let gene = record(&[
            ("approved_symbol", json!("PKD1")),
            ("hgnc_id", json!("HGNC:9008")),
        ]);

        let mut precuration = apply_prefill(&workflow, &gene, "precuration");
        precuration.insert("entity_assertion".to_string(), json!(true));
        precuration.insert("inheritance_difference".to_string(), json!(true));
        precuration.insert("mechanism_difference".to_string(), json!(false));
        precuration.insert("phenotypic_variability".to_string(), json!(false));

        let stage = precuration_stage(&workflow);
        let mut state = DecisionState::default();
        let result = evaluate_decision_rules(stage, &precuration, &mut state);

        assert_eq!(result.get("approved_symbol"), Some(&json!("PKD1")));
        assert_eq!(result.get("decision"), Some(&json!("Split")));
    }
}
