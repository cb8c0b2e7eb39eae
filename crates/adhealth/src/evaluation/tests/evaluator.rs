use serde_json::{json, Value};

use super::common::*;
use crate::evaluation::{
    EvaluationMethod, EvaluationStatus, RawOutput, ResultEvaluator, RuleEvaluator, Severity,
    ThresholdSet,
};

fn rules(entries: &[(&str, &str, &str)]) -> Value {
    let rules: Vec<Value> = entries
        .iter()
        .map(|(condition, status, title)| {
            json!({ "Condition": condition, "Status": status, "Title": title })
        })
        .collect();
    json!({ "Rules": rules })
}

#[test]
fn time_skew_rule_fails_large_offsets() {
    let output = RawOutput::from(json!({ "Name": "DC01", "OffsetSeconds": 400 }));

    let verdict = RuleEvaluator
        .evaluate(&time_skew_definition(), &output, &ThresholdSet::new())
        .expect("evaluates");

    assert_eq!(verdict.status, EvaluationStatus::Fail);
    assert_eq!(verdict.method, EvaluationMethod::Rules);
    assert_eq!(verdict.issues.len(), 1);
    let issue = &verdict.issues[0];
    assert_eq!(issue.title, "Time skew");
    assert_eq!(issue.description, "Clock offset exceeds five minutes");
    assert_eq!(issue.severity, Severity::Critical);
    assert_eq!(issue.affected_object, "DC01");
    assert_eq!(issue.evidence, output.to_value());
    assert_eq!(issue.recommendation, "Follow the TIME-001 runbook");
}

#[test]
fn time_skew_rule_passes_small_offsets() {
    let output = RawOutput::from(json!({ "OffsetSeconds": 50 }));

    let verdict = RuleEvaluator
        .evaluate(&time_skew_definition(), &output, &ThresholdSet::new())
        .expect("evaluates");

    assert_eq!(verdict.status, EvaluationStatus::Pass);
    assert!(verdict.issues.is_empty());
}

#[test]
fn later_warnings_never_downgrade_an_earlier_failure() {
    let definition = definition(
        "MIX-001",
        Some(rules(&[
            ("$true", "Pass", "noop"),
            ("$true", "Warning", "first warning"),
            ("$true", "Fail", "failure"),
            ("$true", "Warning", "second warning"),
        ])),
    );

    let verdict = RuleEvaluator
        .evaluate(&definition, &RawOutput::Empty, &ThresholdSet::new())
        .expect("evaluates");

    assert_eq!(verdict.status, EvaluationStatus::Fail);
    let titles: Vec<_> = verdict.issues.iter().map(|issue| issue.title.as_str()).collect();
    assert_eq!(titles, ["first warning", "failure", "second warning"]);
    assert_eq!(verdict.issues[0].severity, Severity::Medium);
    assert_eq!(verdict.issues[1].severity, Severity::Critical);
}

#[test]
fn conditions_compare_against_thresholds() {
    let definition = definition(
        "REPL-002",
        Some(rules(&[
            ("LagMinutes > Replication.MaxLagMinutes", "Fail", "Replication lag"),
            ("LagMinutes > Replication.WarnLagMinutes", "Warning", "Replication slow"),
        ])),
    );
    let thresholds = ThresholdSet::from(
        json!({ "Replication": { "MaxLagMinutes": 60, "WarnLagMinutes": 15 } })
            .as_object()
            .cloned()
            .unwrap_or_default(),
    );

    let warn = RuleEvaluator
        .evaluate(&definition, &RawOutput::from(json!({ "LagMinutes": 30 })), &thresholds)
        .expect("evaluates");
    let fail = RuleEvaluator
        .evaluate(&definition, &RawOutput::from(json!({ "LagMinutes": "90" })), &thresholds)
        .expect("evaluates");

    assert_eq!(warn.status, EvaluationStatus::Warning);
    assert_eq!(warn.issues.len(), 1);
    assert_eq!(fail.status, EvaluationStatus::Fail);
    assert_eq!(fail.issues.len(), 2);
}

#[test]
fn undefined_names_and_broken_conditions_never_match() {
    let definition = definition(
        "MISC-001",
        Some(rules(&[
            ("MissingField > 1", "Fail", "missing"),
            ("OffsetSeconds >", "Fail", "broken"),
            ("Name > 5", "Fail", "type mismatch"),
        ])),
    );

    let verdict = RuleEvaluator
        .evaluate(
            &definition,
            &RawOutput::from(json!({ "Name": "DC01", "OffsetSeconds": 10 })),
            &ThresholdSet::new(),
        )
        .expect("evaluates");

    assert_eq!(verdict.status, EvaluationStatus::Pass);
    assert!(verdict.issues.is_empty());
}

#[test]
fn collection_rules_use_any_and_count() {
    let definition = definition(
        "DC-010",
        Some(rules(&[
            ("Any(Status -eq 'Failed')", "Fail", "Failed controller"),
            ("Count > 2", "Warning", "Too many controllers"),
        ])),
    );
    let output = RawOutput::from(json!([
        { "Name": "DC01", "Status": "Running" },
        { "Name": "DC02", "Status": "failed" },
        { "Name": "DC03", "Status": "Running" }
    ]));

    let verdict = RuleEvaluator
        .evaluate(&definition, &output, &ThresholdSet::new())
        .expect("evaluates");

    assert_eq!(verdict.status, EvaluationStatus::Fail);
    assert_eq!(verdict.issues.len(), 2);
    assert_eq!(verdict.issues[0].affected_object, "3 objects");
}

#[test]
fn string_encoded_rule_sets_are_accepted() {
    let encoded = rules(&[("OffsetSeconds > 300", "Fail", "Time skew")]).to_string();
    let definition = definition("TIME-002", Some(Value::String(encoded)));

    let verdict = RuleEvaluator
        .evaluate(
            &definition,
            &RawOutput::from(json!({ "OffsetSeconds": 301 })),
            &ThresholdSet::new(),
        )
        .expect("evaluates");

    assert_eq!(verdict.status, EvaluationStatus::Fail);
    assert_eq!(verdict.method, EvaluationMethod::Rules);
}

#[test]
fn malformed_or_empty_rule_sets_fall_back_to_heuristic() {
    let output = RawOutput::from(json!({ "Status": "Failed", "Message": "boom" }));

    for rules in [
        Some(Value::String("{ definitely not json".to_string())),
        Some(json!({ "Rules": [{ "Condition": "true", "Status": "Sideways" }] })),
        Some(json!({ "Rules": [] })),
        Some(Value::String("   ".to_string())),
        Some(Value::Null),
        None,
    ] {
        let verdict = RuleEvaluator
            .evaluate(&definition("FB-001", rules.clone()), &output, &ThresholdSet::new())
            .expect("evaluates");

        assert_eq!(verdict.method, EvaluationMethod::Heuristic, "rules {rules:?}");
        assert_eq!(verdict.status, EvaluationStatus::Fail);
        assert_eq!(verdict.issues[0].description, "boom");
    }
}

#[test]
fn issue_ids_are_unique() {
    let definition = definition(
        "MIX-002",
        Some(rules(&[("$true", "Fail", "a"), ("$true", "Fail", "b")])),
    );

    let first = RuleEvaluator
        .evaluate(&definition, &RawOutput::Empty, &ThresholdSet::new())
        .expect("evaluates");
    let second = RuleEvaluator
        .evaluate(&definition, &RawOutput::Empty, &ThresholdSet::new())
        .expect("evaluates");

    let mut ids: Vec<_> = first
        .issues
        .iter()
        .chain(second.issues.iter())
        .map(|issue| issue.issue_id.0.clone())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
