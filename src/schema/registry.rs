//! Versioned schema registry
//!
//! Holds the field schemas for every workflow generation. The built-in
//! generation is the Kidney Genetics gene curation workflow; records stamp
//! the workflow name/version they were produced under, so older generations
//! stay resolvable here.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{FieldDefinition, FieldFormat, FieldGroup, FieldOption, FieldSchema};

/// The three curated entity types, in workflow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Gene,
    Precuration,
    Curation,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Gene => "gene",
            EntityType::Precuration => "precuration",
            EntityType::Curation => "curation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gene" | "genes" => Some(EntityType::Gene),
            "precuration" | "precurations" => Some(EntityType::Precuration),
            "curation" | "curations" => Some(EntityType::Curation),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field schemas for one workflow generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSchemas {
    pub workflow_name: String,
    pub workflow_version: String,
    pub gene: FieldSchema,
    pub precuration: FieldSchema,
    pub curation: FieldSchema,
}

impl WorkflowSchemas {
    pub fn schema(&self, entity: EntityType) -> &FieldSchema {
        match entity {
            EntityType::Gene => &self.gene,
            EntityType::Precuration => &self.precuration,
            EntityType::Curation => &self.curation,
        }
    }
}

/// Registry of workflow schema generations, oldest first
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    generations: Vec<WorkflowSchemas>,
}

impl SchemaRegistry {
    /// Registry seeded with the built-in Kidney Genetics generation
    pub fn builtin() -> Self {
        Self {
            generations: vec![kidney_genetics_schemas()],
        }
    }

    /// The generation new records are created under
    pub fn current(&self) -> &WorkflowSchemas {
        self.generations
            .last()
            .expect("registry holds at least one workflow generation")
    }

    /// Resolve a specific generation by workflow name and version
    pub fn get(&self, name: &str, version: &str) -> Option<&WorkflowSchemas> {
        self.generations
            .iter()
            .find(|g| g.workflow_name == name && g.workflow_version == version)
    }

    /// Schema for an entity under the current generation
    pub fn get_schema(&self, entity: EntityType) -> &FieldSchema {
        self.current().schema(entity)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ----------------------------------------------------------------------------
// Built-in generation: Kidney Genetics Gene Curation v0.1.0
// ----------------------------------------------------------------------------

pub const KIDNEY_GENETICS_NAME: &str = "Kidney Genetics Gene Curation";
pub const KIDNEY_GENETICS_VERSION: &str = "0.1.0";

fn visibility(table: bool, standard: bool, curation: bool) -> BTreeMap<String, bool> {
    BTreeMap::from([
        ("tableView".to_string(), table),
        ("standardView".to_string(), standard),
        ("curationView".to_string(), curation),
    ])
}

fn group(name: &str, order: u32) -> Option<FieldGroup> {
    Some(FieldGroup {
        name: name.to_string(),
        order,
    })
}

fn text(label: &str, description: &str) -> FieldDefinition {
    FieldDefinition {
        label: label.to_string(),
        format: FieldFormat::Text,
        description: description.to_string(),
        ..Default::default()
    }
}

fn number(label: &str, description: &str) -> FieldDefinition {
    FieldDefinition {
        label: label.to_string(),
        format: FieldFormat::Number,
        description: description.to_string(),
        ..Default::default()
    }
}

fn boolean(label: &str, description: &str) -> FieldDefinition {
    FieldDefinition {
        label: label.to_string(),
        format: FieldFormat::Boolean,
        description: description.to_string(),
        ..Default::default()
    }
}

fn array(label: &str, description: &str, separator: &str) -> FieldDefinition {
    FieldDefinition {
        label: label.to_string(),
        format: FieldFormat::Array,
        description: description.to_string(),
        separator: Some(separator.to_string()),
        ..Default::default()
    }
}

fn date(label: &str, description: &str) -> FieldDefinition {
    FieldDefinition {
        label: label.to_string(),
        format: FieldFormat::Date,
        description: description.to_string(),
        ..Default::default()
    }
}

/// System fields shared by all three record schemas
fn with_system_fields(schema: FieldSchema) -> FieldSchema {
    schema
        .with(
            "createdAt",
            date(
                "Created At",
                "The date and time when the record was created.",
            ),
        )
        .with(
            "updatedAt",
            date(
                "Updated At",
                "The date and time when the record was last updated.",
            ),
        )
        .with(
            "workflowConfigVersionUsed",
            text(
                "Workflow Config Version Used",
                "The version of the workflow configuration used to curate this entity.",
            ),
        )
        .with(
            "workflowConfigNameUsed",
            text(
                "Workflow Config Name Used",
                "The name of the workflow configuration used to curate this entity.",
            ),
        )
        .with(
            "users",
            array(
                "Users",
                "A list of user identifiers who have worked on this record.",
                ",",
            ),
        )
        .with(
            "approvedBy",
            array(
                "Approved By",
                "A list of user identifiers who have approved this record.",
                ",",
            ),
        )
        .with(
            "approvedAt",
            date(
                "Approved At",
                "The date and time when the record was approved.",
            ),
        )
}

fn kidney_gene_schema() -> FieldSchema {
    let schema = FieldSchema::new()
        .with(
            "cur_id",
            text(
                "CUR ID",
                "Unique identifier for the gene within the curation system.",
            ),
        )
        .with("approved_symbol", {
            let mut def = text(
                "Approved Symbol",
                "The official symbol provided by HGNC.",
            );
            def.visibility = visibility(true, true, false);
            def.required = true;
            def
        })
        .with("hgnc_id", {
            let mut def = text("HGNC ID", "Unique identifier provided by the HGNC.");
            def.visibility = visibility(false, true, false);
            def.required = true;
            def
        })
        .with("clingen_summary", {
            let mut def = text(
                "ClinGen Summary",
                "Summary information from the ClinGen database.",
            );
            def.visibility = visibility(false, true, true);
            def
        })
        .with("gencc_summary", {
            let mut def = text("GenCC Summary", "Summary from the GenCC database.");
            def.visibility = visibility(false, true, true);
            def
        })
        .with("omim_summary", {
            let mut def = array(
                "OMIM Summary",
                "Summary information from the Online Mendelian Inheritance in Man database.",
                "|",
            );
            def.visibility = visibility(false, true, true);
            def
        })
        .with("clinical_groups_p", {
            let mut def = text("Clinical Groups", "Clinical groupings based on phenotype.");
            def.visibility = visibility(false, true, true);
            def
        })
        .with("onset_groups_p", {
            let mut def = text(
                "Onset Groups",
                "Information on the onset groups for the gene-related conditions.",
            );
            def.visibility = visibility(false, false, true);
            def
        })
        .with("syndromic_groups_p", {
            let mut def = text(
                "Syndromic Groups",
                "Information about the syndromic grouping of the gene.",
            );
            def.visibility = visibility(false, false, true);
            def
        })
        .with("evidence_count", {
            let mut def = number(
                "Evidence Count",
                "Count of evidence items associated with the gene.",
            );
            def.visibility = visibility(true, true, true);
            def.min = Some(0.0);
            def
        })
        .with("source_count_percentile", {
            let mut def = number(
                "Source Count Percentile",
                "The percentile rank based on the count of sources mentioning the gene.",
            );
            def.min = Some(0.0);
            def.max = Some(100.0);
            def
        })
        .with("clinvar", {
            let mut def = FieldDefinition {
                label: "ClinVar".to_string(),
                format: FieldFormat::Map,
                description: "Data from ClinVar including pathogenicity classifications."
                    .to_string(),
                separator: Some(";".to_string()),
                key_value_separator: Some(":".to_string()),
                ..Default::default()
            };
            def.visibility = visibility(false, true, true);
            def
        })
        .with("expression_score", {
            let mut def = number(
                "Expression Score",
                "Score based on gene expression levels.",
            );
            def.visibility = visibility(false, false, true);
            def
        })
        .with("interaction_score", {
            let mut def = number(
                "Interaction Score",
                "Quantitative score representing gene interactions.",
            );
            def.visibility = visibility(false, false, true);
            def
        })
        .with("pLI", {
            let mut def = number(
                "pLI Score",
                "Probability of being loss-of-function intolerant (pLI) score.",
            );
            def.visibility = visibility(false, true, false);
            def.min = Some(0.0);
            def.max = Some(1.0);
            def
        })
        .with("mgi_phenotype", {
            let mut def = array(
                "MGI Phenotype",
                "Phenotypic information from the Mouse Genome Informatics database.",
                ";",
            );
            def.visibility = visibility(false, true, true);
            def
        })
        .with(
            "hasPrecuration",
            boolean(
                "Has Precuration",
                "Indicates if the gene has an associated precuration record.",
            ),
        )
        .with(
            "hasCuration",
            boolean(
                "Has Curation",
                "Indicates if the gene has an associated curation record.",
            ),
        );

    with_system_fields(schema)
}

fn kidney_precuration_schema() -> FieldSchema {
    let schema = FieldSchema::new()
        .with("approved_symbol", {
            let mut def = text(
                "Approved Symbol",
                "The official gene symbol approved by the HGNC.",
            );
            def.visibility = visibility(true, true, false);
            def.group = group("Identification", 1);
            def.required = true;
            def
        })
        .with("hgnc_id", {
            let mut def = text(
                "HGNC ID",
                "The unique identifier for the gene provided by the HGNC.",
            );
            def.visibility = visibility(false, true, false);
            def.group = group("Identification", 2);
            def
        })
        .with("entity_assertion", {
            let mut def = boolean(
                "Entity Assertion",
                "Whether an assertion about the entity was made.",
            );
            def.visibility = visibility(false, true, true);
            def.group = group("Assessment", 1);
            def
        })
        .with("inheritance_difference", {
            let mut def = boolean(
                "Inheritance Difference",
                "Indicates if there is a difference in inheritance patterns noted.",
            );
            def.visibility = visibility(false, true, true);
            def.group = group("Assessment", 2);
            def
        })
        .with("mechanism_difference", {
            let mut def = boolean(
                "Mechanism Difference",
                "Indicates if there is a difference in the mechanism of action noted.",
            );
            def.visibility = visibility(false, true, true);
            def.group = group("Assessment", 3);
            def
        })
        .with("phenotypic_variability", {
            let mut def = boolean(
                "Phenotypic Variability",
                "Indicates if there is phenotypic variability associated with the gene.",
            );
            def.visibility = visibility(false, true, true);
            def.group = group("Assessment", 4);
            def
        })
        .with("decision", {
            let mut def = text(
                "Decision",
                "The decision made during precuration, lump or split.",
            );
            def.visibility = visibility(true, true, true);
            def.group = group("Decision", 1);
            def.options = vec![FieldOption::plain("Split"), FieldOption::plain("Lump")];
            def
        })
        .with("comment", {
            let mut def = text(
                "Comment",
                "Curator's comment about the decision made regarding the gene.",
            );
            def.visibility = visibility(false, true, true);
            def.group = group("Decision", 2);
            def
        });

    with_system_fields(schema)
}

fn curation_groups_schema() -> FieldSchema {
    FieldSchema::new()
        .with(
            "clinical",
            text("Clinical Group", "Clinical categorization of the gene."),
        )
        .with(
            "onset",
            text(
                "Onset Group",
                "Classifications of the onset group for the gene.",
            ),
        )
        .with(
            "syndromic",
            boolean(
                "Syndromic",
                "Indicates if the gene is part of a syndromic group.",
            ),
        )
}

fn curation_points_schema() -> FieldSchema {
    let bounded = |label: &str, description: &str, max: f64| {
        let mut def = number(label, description);
        def.min = Some(0.0);
        def.max = Some(max);
        def.step = Some(1.0);
        def
    };

    FieldSchema::new()
        .with(
            "variants",
            bounded("Variants", "Number of variants identified.", 12.0),
        )
        .with(
            "models",
            bounded("Models", "Number of animal or cellular models studied.", 4.0),
        )
        .with(
            "functional",
            bounded("Functional", "Number of functional studies performed.", 2.0),
        )
        .with(
            "rescue",
            bounded("Rescue", "Number of rescue experiments performed.", 2.0),
        )
        .with(
            "replication",
            array("Replication", "References to replication studies.", ";"),
        )
}

fn kidney_curation_schema() -> FieldSchema {
    let schema = FieldSchema::new()
        .with("approved_symbol", {
            let mut def = text(
                "Approved Symbol",
                "The official symbol for the gene as provided by HGNC.",
            );
            def.visibility = visibility(true, true, true);
            def.required = true;
            def
        })
        .with("hgnc_id", {
            let mut def = text(
                "HGNC ID",
                "Unique identifier for the gene provided by the HGNC.",
            );
            def.visibility = visibility(false, true, true);
            def
        })
        .with("disease", {
            let mut def = text(
                "Disease",
                "MONDO identifier for the disease associated with the gene.",
            );
            def.visibility = visibility(true, true, true);
            def.required = true;
            def
        })
        .with("inheritance", {
            let mut def = text(
                "Inheritance",
                "Type of inheritance pattern observed for the gene-related conditions.",
            );
            def.visibility = visibility(true, true, true);
            def.required = true;
            def
        })
        .with("groups", {
            FieldDefinition {
                label: "Groups".to_string(),
                format: FieldFormat::Object,
                description:
                    "Group classifications for the gene, such as clinical and syndromic categorizations."
                        .to_string(),
                visibility: visibility(false, true, true),
                nested: Some(Box::new(curation_groups_schema())),
                ..Default::default()
            }
        })
        .with("points", {
            FieldDefinition {
                label: "Points".to_string(),
                format: FieldFormat::Object,
                description:
                    "Quantitative and qualitative assessment points for the gene.".to_string(),
                visibility: visibility(false, true, true),
                nested: Some(Box::new(curation_points_schema())),
                ..Default::default()
            }
        })
        .with("verdict", {
            let mut def = text(
                "Verdict",
                "Final classification of the gene-disease relationship.",
            );
            def.visibility = visibility(true, true, true);
            def.options = vec![
                FieldOption::plain("Definitive"),
                FieldOption::plain("Strong"),
                FieldOption::plain("Moderate"),
                FieldOption::plain("Limited"),
                FieldOption::plain("Disputed"),
                FieldOption::plain("Refuted"),
            ];
            def
        })
        .with("comment", {
            let mut def = text(
                "Comment",
                "Curator's comment about this curated entity.",
            );
            def.visibility = visibility(false, false, true);
            def
        });

    with_system_fields(schema)
}

/// The Kidney Genetics Gene Curation generation
pub fn kidney_genetics_schemas() -> WorkflowSchemas {
    WorkflowSchemas {
        workflow_name: KIDNEY_GENETICS_NAME.to_string(),
        workflow_version: KIDNEY_GENETICS_VERSION.to_string(),
        gene: kidney_gene_schema(),
        precuration: kidney_precuration_schema(),
        curation: kidney_curation_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_resolves_current() {
        let registry = SchemaRegistry::builtin();
        let current = registry.current();
        assert_eq!(current.workflow_name, KIDNEY_GENETICS_NAME);
        assert_eq!(current.workflow_version, KIDNEY_GENETICS_VERSION);
    }

    #[test]
    fn test_lookup_by_name_and_version() {
        let registry = SchemaRegistry::builtin();
        assert!(registry
            .get(KIDNEY_GENETICS_NAME, KIDNEY_GENETICS_VERSION)
            .is_some());
        assert!(registry.get(KIDNEY_GENETICS_NAME, "9.9.9").is_none());
    }

    #[test]
    fn test_all_entities_have_schemas() {
        let registry = SchemaRegistry::builtin();
        for entity in [EntityType::Gene, EntityType::Precuration, EntityType::Curation] {
            assert!(!registry.get_schema(entity).is_empty());
        }
    }

    #[test]
    fn test_precuration_schema_carries_assessment_fields() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get_schema(EntityType::Precuration);

        for key in [
            "entity_assertion",
            "inheritance_difference",
            "mechanism_difference",
            "phenotypic_variability",
            "decision",
        ] {
            assert!(schema.contains_key(key), "missing {key}");
        }

        let decision = schema.get("decision").unwrap();
        let values: Vec<&str> = decision.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["Split", "Lump"]);
    }

    #[test]
    fn test_curation_nested_schemas() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get_schema(EntityType::Curation);

        let points = schema.get("points").unwrap();
        let nested = points.nested.as_ref().unwrap();
        assert_eq!(nested.get("variants").unwrap().min, Some(0.0));
        assert!(schema.get("groups").unwrap().nested.is_some());
    }

    #[test]
    fn test_entity_type_parse() {
        assert_eq!(EntityType::parse("genes"), Some(EntityType::Gene));
        assert_eq!(EntityType::parse("curation"), Some(EntityType::Curation));
        assert_eq!(EntityType::parse("bogus"), None);
    }
}
