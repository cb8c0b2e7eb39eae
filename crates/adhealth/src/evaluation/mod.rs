//! Result evaluation for directory-service health checks.
//!
//! Execution results produced by the check runners are matched to their
//! check definitions and classified as `Pass`, `Warning` or `Fail`. Checks
//! that ship an evaluation rule set are judged by their rules; everything
//! else falls back to a conventional-field heuristic.

mod catalog;
mod classifier;
pub mod condition;
mod domain;
mod orchestrator;
mod policy;
mod record;
mod resolvers;
pub mod router;
mod rules;
pub mod service;
mod thresholds;
mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, CheckCatalog};
pub use condition::{condition_matches, Condition, ConditionError};
pub use domain::{
    CheckDefinition, CheckId, EvaluatedResult, EvaluationMethod, EvaluationStatus,
    ExecutionResult, ExecutionStatus, Issue, IssueId, Severity,
};
pub use orchestrator::{
    evaluate_batch, EvaluationEngine, EvaluationError, EvaluationReport, EvaluationSummary,
};
pub use record::{FieldValue, RawOutput, Record};
pub use resolvers::{affected_object, severity_from_status};
pub use router::evaluation_router;
pub use rules::{EvaluationRule, RuleSet, RuleSetError};
pub use service::{
    EvaluationRequest, EvaluationService, EvaluationServiceError, ValidationReport,
    ValidationRequest,
};
pub use thresholds::ThresholdSet;
pub use validation::{validate_definitions, RuleProblem};

use classifier::classify_by_convention;
use rules::apply_rules;
use tracing::warn;

/// Status, issues and the path that produced them for one result.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: EvaluationStatus,
    pub issues: Vec<Issue>,
    pub method: EvaluationMethod,
}

/// Classifies the raw output of a check that executed successfully.
pub trait ResultEvaluator: Send + Sync {
    fn evaluate(
        &self,
        definition: &CheckDefinition,
        output: &RawOutput,
        thresholds: &ThresholdSet,
    ) -> Result<Verdict, EvaluationError>;
}

/// Rule-driven evaluator with the conventional-field heuristic as fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl ResultEvaluator for RuleEvaluator {
    fn evaluate(
        &self,
        definition: &CheckDefinition,
        output: &RawOutput,
        thresholds: &ThresholdSet,
    ) -> Result<Verdict, EvaluationError> {
        let rules = match definition.rule_set() {
            Some(Ok(rules)) if !rules.is_empty() => Some(rules),
            Some(Ok(_)) | None => None,
            Some(Err(err)) => {
                warn!(
                    check_id = %definition.check_id,
                    error = %err,
                    "ignoring evaluation rules; using default classification"
                );
                None
            }
        };

        let verdict = match rules {
            Some(rules) => {
                let (status, issues) = apply_rules(definition, &rules, output, thresholds);
                Verdict {
                    status,
                    issues,
                    method: EvaluationMethod::Rules,
                }
            }
            None => {
                let (status, issues) = classify_by_convention(definition, output);
                Verdict {
                    status,
                    issues,
                    method: EvaluationMethod::Heuristic,
                }
            }
        };

        Ok(verdict)
    }
}
