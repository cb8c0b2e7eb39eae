use serde_json::json;

use super::common::*;
use crate::evaluation::classifier::classify_by_convention;
use crate::evaluation::{EvaluationStatus, RawOutput, Severity};

#[test]
fn scalar_failure_statuses_raise_one_issue() {
    let definition = definition("REPL-001", None);

    for status in ["Failed", "error", "CRITICAL"] {
        let output = RawOutput::from(json!({
            "Status": status,
            "Message": "Replication stalled for 6 hours",
            "AffectedObject": "DC02"
        }));

        let (verdict, issues) = classify_by_convention(&definition, &output);

        assert_eq!(verdict, EvaluationStatus::Fail, "status {status}");
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.title, "REPL-001 check");
        assert_eq!(issue.description, "Replication stalled for 6 hours");
        assert_eq!(issue.affected_object, "DC02");
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.evidence, output.to_value());
        assert_eq!(issue.recommendation, "Follow the REPL-001 runbook");
    }
}

#[test]
fn scalar_failure_without_message_uses_placeholders() {
    let definition = definition("REPL-001", None);
    let output = RawOutput::from(json!({ "Status": "Failed" }));

    let (_, issues) = classify_by_convention(&definition, &output);

    assert_eq!(issues[0].description, "N/A");
    assert_eq!(issues[0].affected_object, "N/A");
}

#[test]
fn scalar_warning_status_warns_without_issues() {
    let definition = definition("DNS-002", None);
    let output = RawOutput::from(json!({ "Status": "Warning", "Message": "Slow lookups" }));

    let (verdict, issues) = classify_by_convention(&definition, &output);

    assert_eq!(verdict, EvaluationStatus::Warning);
    assert!(issues.is_empty());
}

#[test]
fn scalar_with_other_or_missing_status_passes() {
    let definition = definition("DNS-002", None);

    for output in [json!({ "Status": "Healthy" }), json!({ "Name": "DC01" })] {
        let (verdict, issues) = classify_by_convention(&definition, &RawOutput::from(output));
        assert_eq!(verdict, EvaluationStatus::Pass);
        assert!(issues.is_empty());
    }
}

#[test]
fn sequence_raises_one_issue_per_failing_element() {
    let definition = definition("DC-004", None);
    let output = RawOutput::from(json!([
        { "Name": "DC01", "HasIssue": true, "Message": "SYSVOL not shared" },
        { "Name": "DC02", "HasIssue": false },
        { "ComputerName": "DC03", "IsHealthy": false },
        { "Status": "Error" },
        { "Name": "DC05", "Status": "Warning" }
    ]));

    let (verdict, issues) = classify_by_convention(&definition, &output);

    assert_eq!(verdict, EvaluationStatus::Fail);
    let objects: Vec<_> = issues.iter().map(|issue| issue.affected_object.as_str()).collect();
    assert_eq!(objects, ["DC01", "DC03", "Unknown"]);
    assert_eq!(issues[0].description, "SYSVOL not shared");
    assert_eq!(issues[1].description, "DC03 reported a problem");
    assert_eq!(issues[1].evidence, json!({ "ComputerName": "DC03", "IsHealthy": false }));
}

#[test]
fn sequence_never_warns() {
    let definition = definition("DC-004", None);
    let output = RawOutput::from(json!([
        { "Name": "DC01", "Status": "Warning" },
        { "Name": "DC02", "Status": "Critical" }
    ]));

    let (verdict, issues) = classify_by_convention(&definition, &output);

    assert_eq!(verdict, EvaluationStatus::Pass);
    assert!(issues.is_empty());
}

#[test]
fn empty_output_passes() {
    let (verdict, issues) = classify_by_convention(&definition("X", None), &RawOutput::Empty);
    assert_eq!(verdict, EvaluationStatus::Pass);
    assert!(issues.is_empty());
}
