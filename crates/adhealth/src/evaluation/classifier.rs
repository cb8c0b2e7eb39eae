use super::domain::{CheckDefinition, EvaluationStatus, Issue, IssueId};
use super::record::{RawOutput, Record};
use super::resolvers::severity_from_status;
use serde_json::Value;

const SCALAR_FAILURE_STATUSES: [&str; 3] = ["Failed", "Error", "Critical"];
const ELEMENT_FAILURE_STATUSES: [&str; 2] = ["Failed", "Error"];

fn status_in(record: &Record, statuses: &[&str]) -> bool {
    record
        .text("Status")
        .is_some_and(|status| statuses.iter().any(|s| status.trim().eq_ignore_ascii_case(s)))
}

fn element_failed(record: &Record) -> bool {
    status_in(record, &ELEMENT_FAILURE_STATUSES)
        || record.bool("IsHealthy") == Some(false)
        || record.bool("HasIssue") == Some(true)
}

fn heuristic_issue(
    definition: &CheckDefinition,
    description: String,
    affected_object: String,
    evidence: Value,
) -> Issue {
    Issue {
        issue_id: IssueId::next(),
        severity: severity_from_status(EvaluationStatus::Fail.as_str(), definition.severity),
        title: definition.check_name.clone(),
        description,
        affected_object,
        evidence,
        recommendation: definition.remediation_steps.clone(),
    }
}

/// Conventional-field classification for checks that ship no usable rules.
///
/// Sequence outputs are never classified as `Warning`: any failing element
/// fails the whole check.
pub(crate) fn classify_by_convention(
    definition: &CheckDefinition,
    output: &RawOutput,
) -> (EvaluationStatus, Vec<Issue>) {
    match output {
        RawOutput::Scalar(record) => {
            if status_in(record, &SCALAR_FAILURE_STATUSES) {
                let issue = heuristic_issue(
                    definition,
                    record.text("Message").unwrap_or_else(|| "N/A".to_string()),
                    record
                        .text("AffectedObject")
                        .unwrap_or_else(|| "N/A".to_string()),
                    output.to_value(),
                );
                (EvaluationStatus::Fail, vec![issue])
            } else if status_in(record, &["Warning"]) {
                (EvaluationStatus::Warning, Vec::new())
            } else {
                (EvaluationStatus::Pass, Vec::new())
            }
        }
        RawOutput::Sequence(records) => {
            let issues: Vec<Issue> = records
                .iter()
                .filter(|record| element_failed(record))
                .map(|record| {
                    let affected = record
                        .text("Name")
                        .or_else(|| record.text("ComputerName"))
                        .unwrap_or_else(|| "Unknown".to_string());
                    let description = record
                        .text("Message")
                        .unwrap_or_else(|| format!("{affected} reported a problem"));
                    heuristic_issue(definition, description, affected, Value::from(record.clone()))
                })
                .collect();

            if issues.is_empty() {
                (EvaluationStatus::Pass, issues)
            } else {
                (EvaluationStatus::Fail, issues)
            }
        }
        RawOutput::Empty => (EvaluationStatus::Pass, Vec::new()),
    }
}
