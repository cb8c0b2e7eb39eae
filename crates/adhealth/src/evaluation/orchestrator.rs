use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{
    CheckDefinition, CheckId, EvaluatedResult, EvaluationMethod, EvaluationStatus,
    ExecutionResult, Issue, IssueId,
};
use super::resolvers::{affected_object, severity_from_status};
use super::thresholds::ThresholdSet;
use super::{ResultEvaluator, RuleEvaluator, Verdict};

/// Failure raised by a [`ResultEvaluator`] for a single result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("{0}")]
    Failed(String),
    #[error("evaluator panicked: {0}")]
    Panicked(String),
}

/// Run-level counters over a batch of evaluated results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationSummary {
    pub total_checks: usize,
    pub pass_count: usize,
    pub warning_count: usize,
    pub fail_count: usize,
    pub total_issues: usize,
    /// Execution records dropped because no definition matched them.
    pub skipped_count: usize,
}

impl EvaluationSummary {
    pub fn tally(results: &[EvaluatedResult], skipped_count: usize) -> Self {
        results.iter().fold(
            Self {
                skipped_count,
                ..Self::default()
            },
            |mut summary, result| {
                summary.total_checks += 1;
                summary.total_issues += result.issue_count();
                match result.evaluation_status {
                    EvaluationStatus::Pass => summary.pass_count += 1,
                    EvaluationStatus::Warning => summary.warning_count += 1,
                    EvaluationStatus::Fail => summary.fail_count += 1,
                }
                summary
            },
        )
    }
}

/// Evaluated results in input order plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationReport {
    pub results: Vec<EvaluatedResult>,
    pub summary: EvaluationSummary,
}

/// Matches execution results to definitions and classifies each one.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine<E = RuleEvaluator> {
    evaluator: E,
}

impl EvaluationEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: ResultEvaluator> EvaluationEngine<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Evaluates a whole batch. Per-result failures never abort the batch.
    pub fn evaluate_batch(
        &self,
        results: &[ExecutionResult],
        definitions: &[CheckDefinition],
        thresholds: &ThresholdSet,
    ) -> EvaluationReport {
        let index: HashMap<&CheckId, &CheckDefinition> = definitions
            .iter()
            .map(|definition| (&definition.check_id, definition))
            .collect();

        let mut evaluated = Vec::with_capacity(results.len());
        let mut skipped = 0;

        for result in results {
            let Some(definition) = index.get(&result.check_id) else {
                warn!(check_id = %result.check_id, "no check definition for execution result; skipping");
                skipped += 1;
                continue;
            };
            evaluated.push(self.evaluate_result(definition, result, thresholds));
        }

        let summary = EvaluationSummary::tally(&evaluated, skipped);
        info!(
            total = summary.total_checks,
            pass = summary.pass_count,
            warning = summary.warning_count,
            fail = summary.fail_count,
            issues = summary.total_issues,
            skipped = summary.skipped_count,
            "evaluation batch complete"
        );

        EvaluationReport {
            results: evaluated,
            summary,
        }
    }

    /// Evaluates one execution result against its definition.
    pub fn evaluate_result(
        &self,
        definition: &CheckDefinition,
        result: &ExecutionResult,
        thresholds: &ThresholdSet,
    ) -> EvaluatedResult {
        if result.status.is_failure() {
            return execution_failure(definition, result);
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.evaluator
                .evaluate(definition, &result.raw_output, thresholds)
        }))
        .unwrap_or_else(|payload| Err(EvaluationError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(verdict) => assemble(definition, result, verdict, None),
            Err(err) => {
                error!(check_id = %definition.check_id, error = %err, "evaluation failed");
                evaluator_failure(definition, result, &err)
            }
        }
    }
}

/// Evaluates a batch with the standard rule evaluator.
pub fn evaluate_batch(
    results: &[ExecutionResult],
    definitions: &[CheckDefinition],
    thresholds: &ThresholdSet,
) -> EvaluationReport {
    EvaluationEngine::new().evaluate_batch(results, definitions, thresholds)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn assemble(
    definition: &CheckDefinition,
    result: &ExecutionResult,
    verdict: Verdict,
    error_message: Option<String>,
) -> EvaluatedResult {
    EvaluatedResult {
        check_id: definition.check_id.clone(),
        check_name: definition.check_name.clone(),
        category_id: definition.category_id.clone(),
        severity: definition.severity,
        start_time: result.start_time,
        end_time: result.end_time,
        duration_ms: result.duration_ms,
        execution_status: result.status,
        evaluation_status: verdict.status,
        evaluation_method: verdict.method,
        raw_output: result.raw_output.clone(),
        issues: verdict.issues,
        error_message,
    }
}

fn failure_issue(
    definition: &CheckDefinition,
    result: &ExecutionResult,
    title: &str,
    description: String,
) -> Issue {
    Issue {
        issue_id: IssueId::next(),
        severity: severity_from_status(EvaluationStatus::Fail.as_str(), definition.severity),
        title: title.to_string(),
        description,
        affected_object: affected_object(&result.raw_output, None),
        evidence: result.raw_output.to_value(),
        recommendation: definition.remediation_steps.clone(),
    }
}

fn execution_failure(definition: &CheckDefinition, result: &ExecutionResult) -> EvaluatedResult {
    let message = result
        .error_message
        .clone()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "no error message was reported".to_string());

    let issue = failure_issue(
        definition,
        result,
        "Check execution failed",
        format!("Check execution failed: {message}"),
    );
    let verdict = Verdict {
        status: EvaluationStatus::Fail,
        issues: vec![issue],
        method: EvaluationMethod::ExecutionFailure,
    };

    assemble(definition, result, verdict, Some(message))
}

fn evaluator_failure(
    definition: &CheckDefinition,
    result: &ExecutionResult,
    err: &EvaluationError,
) -> EvaluatedResult {
    let message = format!("Evaluation error: {err}");
    let issue = failure_issue(definition, result, "Result evaluation failed", message.clone());
    let verdict = Verdict {
        status: EvaluationStatus::Fail,
        issues: vec![issue],
        method: EvaluationMethod::EvaluatorError,
    };

    assemble(definition, result, verdict, Some(message))
}
