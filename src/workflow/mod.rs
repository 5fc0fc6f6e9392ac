//! Workflow stage configuration and engine
//!
//! An ordered stage list (gene -> precuration -> curation), each stage
//! referencing a field schema version, a next-stage pointer, prefill-mapping
//! rules, and threshold decision rules. The engine applies prefill mappings
//! when a downstream record is seeded and evaluates decision rules against
//! record values, tracking manual overrides in explicit per-form state.

mod config;
mod engine;

pub use config::{
    kidney_genetics_workflow, DecisionRule, PrefillFieldMap, PrefillRule, StageConfig,
    WorkflowConfig,
};
pub use engine::{
    apply_prefill, evaluate_decision_rules, register_decision_change, DecisionState,
    MANUAL_OVERRIDE_NOTE,
};
