use super::domain::Severity;
use super::record::RawOutput;
use super::rules::EvaluationRule;

/// Fields consulted, in order, when naming the object a scalar record describes.
const AFFECTED_OBJECT_FIELDS: [&str; 6] = [
    "Name",
    "ComputerName",
    "ServerName",
    "DomainController",
    "DN",
    "DistinguishedName",
];

/// Maps a status label to an issue severity, falling back to the check's baseline.
pub fn severity_from_status(status: &str, default: Severity) -> Severity {
    match status.trim().to_ascii_lowercase().as_str() {
        "fail" => Severity::Critical,
        "warning" => Severity::Medium,
        "pass" => Severity::Low,
        _ => default,
    }
}

/// Human-readable label for what a triggered rule is about.
///
/// Resolution currently depends only on the output shape; the rule is unused.
pub fn affected_object(output: &RawOutput, _rule: Option<&EvaluationRule>) -> String {
    match output {
        RawOutput::Scalar(record) => AFFECTED_OBJECT_FIELDS
            .iter()
            .find_map(|field| record.text(field))
            .unwrap_or_else(|| "N/A".to_string()),
        RawOutput::Sequence(records) => format!("{} objects", records.len()),
        RawOutput::Empty => "N/A".to_string(),
    }
}
