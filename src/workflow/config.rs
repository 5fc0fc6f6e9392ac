//! Workflow stage configuration
//!
//! Declarative, versioned description of the curation workflow: stage order,
//! per-stage schema versions, prefill mappings, and decision rules. The
//! built-in configuration is the Kidney Genetics generation; its integrity
//! can be checked against the schema registry before serving requests.

use serde::Serialize;

use crate::schema::{EntityType, WorkflowSchemas};
use crate::types::{CuratorError, Result};

/// One source-field to target-field copy mapping
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillFieldMap {
    pub source_field: String,
    pub target_field: String,
}

/// Copy-on-create rule seeding a downstream stage from an upstream record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillRule {
    pub source_stage: String,
    pub target_stage: String,
    pub fields: Vec<PrefillFieldMap>,
}

/// Threshold rule that auto-selects a categorical decision field when enough
/// boolean condition fields are truthy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRule {
    /// The categorical field the rule sets
    pub field: String,
    /// Boolean condition fields counted toward the threshold
    pub conditions: Vec<String>,
    /// Value assigned when the threshold is met
    pub decision: String,
    /// Minimum number of truthy conditions
    pub threshold: usize,
}

/// Configuration of a single workflow stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub name: String,
    pub entity: EntityType,
    pub schema_version: String,
    pub next_stage: Option<String>,
    pub prefill_rules: Vec<PrefillRule>,
    pub decision_rules: Vec<DecisionRule>,
}

/// Ordered workflow stage configuration for one generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConfig {
    pub name: String,
    pub version: String,
    pub stages: Vec<StageConfig>,
}

impl WorkflowConfig {
    /// Look up a stage by name
    pub fn get_stage(&self, name: &str) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// All prefill rules whose target is the given stage, across the workflow
    pub fn prefill_rules_for(&self, target_stage: &str) -> Vec<&PrefillRule> {
        self.stages
            .iter()
            .flat_map(|s| s.prefill_rules.iter())
            .filter(|r| r.target_stage == target_stage)
            .collect()
    }

    /// Check configuration integrity against the schema registry:
    /// next-stage pointers resolve, every field referenced by a prefill or
    /// decision rule exists in the relevant stage's schema, and every
    /// decision threshold is within its condition count.
    pub fn validate(&self, schemas: &WorkflowSchemas) -> Result<()> {
        for stage in &self.stages {
            if let Some(next) = &stage.next_stage {
                if self.get_stage(next).is_none() {
                    return Err(CuratorError::Config(format!(
                        "stage '{}' points to unknown next stage '{}'",
                        stage.name, next
                    )));
                }
            }

            for rule in &stage.prefill_rules {
                let source = self.get_stage(&rule.source_stage).ok_or_else(|| {
                    CuratorError::Config(format!(
                        "prefill rule in stage '{}' references unknown source stage '{}'",
                        stage.name, rule.source_stage
                    ))
                })?;
                let target = self.get_stage(&rule.target_stage).ok_or_else(|| {
                    CuratorError::Config(format!(
                        "prefill rule in stage '{}' references unknown target stage '{}'",
                        stage.name, rule.target_stage
                    ))
                })?;

                let source_schema = schemas.schema(source.entity);
                let target_schema = schemas.schema(target.entity);
                for mapping in &rule.fields {
                    if !source_schema.contains_key(&mapping.source_field) {
                        return Err(CuratorError::Config(format!(
                            "prefill source field '{}' is not in the '{}' schema",
                            mapping.source_field, rule.source_stage
                        )));
                    }
                    if !target_schema.contains_key(&mapping.target_field) {
                        return Err(CuratorError::Config(format!(
                            "prefill target field '{}' is not in the '{}' schema",
                            mapping.target_field, rule.target_stage
                        )));
                    }
                }
            }

            let stage_schema = schemas.schema(stage.entity);
            for rule in &stage.decision_rules {
                if rule.threshold > rule.conditions.len() {
                    return Err(CuratorError::Config(format!(
                        "decision rule on '{}' in stage '{}' has threshold {} over {} conditions",
                        rule.field,
                        stage.name,
                        rule.threshold,
                        rule.conditions.len()
                    )));
                }
                if !stage_schema.contains_key(&rule.field) {
                    return Err(CuratorError::Config(format!(
                        "decision field '{}' is not in the '{}' schema",
                        rule.field, stage.name
                    )));
                }
                for condition in &rule.conditions {
                    if !stage_schema.contains_key(condition) {
                        return Err(CuratorError::Config(format!(
                            "decision condition '{}' is not in the '{}' schema",
                            condition, stage.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// The built-in Kidney Genetics Gene Curation workflow, v0.1.0
pub fn kidney_genetics_workflow() -> WorkflowConfig {
    let identity_fields = || {
        vec![
            PrefillFieldMap {
                source_field: "approved_symbol".to_string(),
                target_field: "approved_symbol".to_string(),
            },
            PrefillFieldMap {
                source_field: "hgnc_id".to_string(),
                target_field: "hgnc_id".to_string(),
            },
        ]
    };

    WorkflowConfig {
        name: "Kidney Genetics Gene Curation".to_string(),
        version: "0.1.0".to_string(),
        stages: vec![
            StageConfig {
                name: "gene".to_string(),
                entity: EntityType::Gene,
                schema_version: "0.1.0".to_string(),
                next_stage: Some("precuration".to_string()),
                prefill_rules: vec![],
                decision_rules: vec![],
            },
            StageConfig {
                name: "precuration".to_string(),
                entity: EntityType::Precuration,
                schema_version: "0.1.0".to_string(),
                next_stage: Some("curation".to_string()),
                prefill_rules: vec![PrefillRule {
                    source_stage: "gene".to_string(),
                    target_stage: "precuration".to_string(),
                    fields: identity_fields(),
                }],
                decision_rules: vec![DecisionRule {
                    field: "decision".to_string(),
                    conditions: vec![
                        "entity_assertion".to_string(),
                        "inheritance_difference".to_string(),
                        "mechanism_difference".to_string(),
                        "phenotypic_variability".to_string(),
                    ],
                    decision: "Split".to_string(),
                    threshold: 2,
                }],
            },
            StageConfig {
                name: "curation".to_string(),
                entity: EntityType::Curation,
                schema_version: "0.1.0".to_string(),
                next_stage: None,
                prefill_rules: vec![PrefillRule {
                    source_stage: "precuration".to_string(),
                    target_stage: "curation".to_string(),
                    fields: identity_fields(),
                }],
                decision_rules: vec![],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    #[test]
    fn test_builtin_workflow_is_internally_consistent() {
        let registry = SchemaRegistry::builtin();
        let workflow = kidney_genetics_workflow();
        workflow.validate(registry.current()).unwrap();
    }

    #[test]
    fn test_stage_order_and_pointers() {
        let workflow = kidney_genetics_workflow();
        let names: Vec<&str> = workflow.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["gene", "precuration", "curation"]);

        assert_eq!(
            workflow.get_stage("gene").unwrap().next_stage.as_deref(),
            Some("precuration")
        );
        assert_eq!(workflow.get_stage("curation").unwrap().next_stage, None);
        assert!(workflow.get_stage("review").is_none());
    }

    #[test]
    fn test_threshold_within_condition_count() {
        let workflow = kidney_genetics_workflow();
        let stage = workflow.get_stage("precuration").unwrap();
        let rule = &stage.decision_rules[0];
        assert!(rule.threshold <= rule.conditions.len());
    }

    #[test]
    fn test_unknown_rule_field_rejected() {
        let registry = SchemaRegistry::builtin();
        let mut workflow = kidney_genetics_workflow();
        workflow.stages[1].decision_rules[0]
            .conditions
            .push("no_such_field".to_string());

        assert!(workflow.validate(registry.current()).is_err());
    }

    #[test]
    fn test_excessive_threshold_rejected() {
        let registry = SchemaRegistry::builtin();
        let mut workflow = kidney_genetics_workflow();
        workflow.stages[1].decision_rules[0].threshold = 9;

        assert!(workflow.validate(registry.current()).is_err());
    }

    #[test]
    fn test_prefill_rules_for_target() {
        let workflow = kidney_genetics_workflow();
        let rules = workflow.prefill_rules_for("precuration");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].source_stage, "gene");
    }
}
