use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::evaluation::{
    CheckCatalog, CheckDefinition, CheckId, EvaluationError, EvaluationMethod, EvaluationService,
    EvaluationStatus, ExecutionResult, ExecutionStatus, RawOutput, ResultEvaluator, RuleEvaluator,
    Severity, ThresholdSet, Verdict,
};

pub(super) fn definition(id: &str, rules: Option<Value>) -> CheckDefinition {
    CheckDefinition {
        check_id: CheckId::from(id),
        check_name: format!("{id} check"),
        category_id: "DC".to_string(),
        severity: Severity::High,
        evaluation_rules: rules,
        remediation_steps: format!("Follow the {id} runbook"),
    }
}

pub(super) fn time_skew_definition() -> CheckDefinition {
    definition(
        "TIME-001",
        Some(serde_json::json!({
            "Rules": [{
                "Condition": "OffsetSeconds > 300",
                "Status": "Fail",
                "Title": "Time skew",
                "Description": "Clock offset exceeds five minutes"
            }]
        })),
    )
}

pub(super) fn completed(id: &str, output: Value) -> ExecutionResult {
    ExecutionResult {
        check_id: CheckId::from(id),
        status: ExecutionStatus::Completed,
        start_time: None,
        end_time: None,
        duration_ms: Some(12.5),
        raw_output: RawOutput::from(output),
        error_message: None,
    }
}

pub(super) fn errored(id: &str, message: &str) -> ExecutionResult {
    ExecutionResult {
        check_id: CheckId::from(id),
        status: ExecutionStatus::Error,
        start_time: None,
        end_time: None,
        duration_ms: None,
        raw_output: RawOutput::Empty,
        error_message: Some(message.to_string()),
    }
}

pub(super) fn service_with(definitions: Vec<CheckDefinition>) -> Arc<EvaluationService> {
    Arc::new(EvaluationService::new(
        CheckCatalog::from_definitions(definitions),
        ThresholdSet::new().with("MaxTimeSkewSeconds", 300_i64),
    ))
}

pub(super) async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}

/// Records how often it is consulted and always passes.
#[derive(Default)]
pub(super) struct CountingEvaluator {
    pub(super) calls: AtomicUsize,
}

impl CountingEvaluator {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResultEvaluator for CountingEvaluator {
    fn evaluate(
        &self,
        _definition: &CheckDefinition,
        _output: &RawOutput,
        _thresholds: &ThresholdSet,
    ) -> Result<Verdict, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Verdict {
            status: EvaluationStatus::Pass,
            issues: Vec::new(),
            method: EvaluationMethod::Rules,
        })
    }
}

/// Fails for one check id and panics for another.
pub(super) struct FaultyEvaluator {
    pub(super) failing: &'static str,
    pub(super) panicking: &'static str,
}

impl ResultEvaluator for FaultyEvaluator {
    fn evaluate(
        &self,
        definition: &CheckDefinition,
        output: &RawOutput,
        thresholds: &ThresholdSet,
    ) -> Result<Verdict, EvaluationError> {
        match definition.check_id.as_str() {
            id if id == self.failing => Err(EvaluationError::Failed("rule store offline".to_string())),
            id if id == self.panicking => panic!("evaluator bug"),
            _ => RuleEvaluator.evaluate(definition, output, thresholds),
        }
    }
}
