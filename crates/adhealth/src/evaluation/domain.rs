use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::record::RawOutput;
use super::rules::{RuleSet, RuleSetError};

/// Identifier of a check, shared by its definition and its execution results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckId(pub String);

impl CheckId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CheckId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Severity attached to checks and the issues they raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" | "informational" => Ok(Self::Info),
            "low" => Ok(Self::Low),
            "medium" | "moderate" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Engine verdict for a check, totally ordered `Pass < Warning < Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum EvaluationStatus {
    Pass,
    Warning,
    Fail,
}

impl EvaluationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Warning => "Warning",
            Self::Fail => "Fail",
        }
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" | "passed" => Ok(Self::Pass),
            "warning" | "warn" => Ok(Self::Warning),
            "fail" | "failed" => Ok(Self::Fail),
            other => Err(format!("unknown evaluation status '{other}'")),
        }
    }
}

impl TryFrom<String> for EvaluationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether the collector itself ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ExecutionStatus {
    Completed,
    Error,
}

impl ExecutionStatus {
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl From<String> for ExecutionStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" | "success" | "succeeded" => Self::Completed,
            _ => Self::Error,
        }
    }
}

/// Static description of a check, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckDefinition {
    pub check_id: CheckId,
    pub check_name: String,
    #[serde(default)]
    pub category_id: String,
    pub severity: Severity,
    /// JSON-encoded rule set, either embedded or as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_rules: Option<Value>,
    #[serde(default)]
    pub remediation_steps: String,
}

impl CheckDefinition {
    /// Decodes the attached rule set; `None` when the check ships no rules.
    pub fn rule_set(&self) -> Option<Result<RuleSet, RuleSetError>> {
        match self.evaluation_rules.as_ref()? {
            Value::Null => None,
            Value::String(encoded) if encoded.trim().is_empty() => None,
            Value::String(encoded) => Some(RuleSet::from_json_str(encoded)),
            other => Some(RuleSet::from_json_value(other)),
        }
    }
}

/// Output of one collector run, as handed over by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionResult {
    pub check_id: CheckId,
    pub status: ExecutionStatus,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub raw_output: RawOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    // Collectors disagree on timestamp shapes; only text is interpreted.
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => parse_timestamp(&text),
        _ => None,
    })
}

static ISSUE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Process-unique issue identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueId(pub String);

impl IssueId {
    pub fn next() -> Self {
        let id = ISSUE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("ISS-{id:06}"))
    }
}

/// Structured finding raised by a `Warning` or `Fail` classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Issue {
    pub issue_id: IssueId,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub affected_object: String,
    pub evidence: Value,
    pub recommendation: String,
}

/// Which path produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationMethod {
    Rules,
    Heuristic,
    ExecutionFailure,
    EvaluatorError,
}

/// Final verdict for one check execution.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedResult {
    pub check_id: CheckId,
    pub check_name: String,
    pub category_id: String,
    pub severity: Severity,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<f64>,
    pub execution_status: ExecutionStatus,
    pub evaluation_status: EvaluationStatus,
    pub evaluation_method: EvaluationMethod,
    pub raw_output: RawOutput,
    pub issues: Vec<Issue>,
    pub error_message: Option<String>,
}

impl EvaluatedResult {
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

impl Serialize for EvaluatedResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("EvaluatedResult", 15)?;
        state.serialize_field("CheckId", &self.check_id)?;
        state.serialize_field("CheckName", &self.check_name)?;
        state.serialize_field("CategoryId", &self.category_id)?;
        state.serialize_field("Severity", &self.severity)?;
        state.serialize_field("StartTime", &self.start_time)?;
        state.serialize_field("EndTime", &self.end_time)?;
        state.serialize_field("DurationMs", &self.duration_ms)?;
        state.serialize_field("ExecutionStatus", &self.execution_status)?;
        state.serialize_field("EvaluationStatus", &self.evaluation_status)?;
        state.serialize_field("EvaluationMethod", &self.evaluation_method)?;
        state.serialize_field("RawOutput", &self.raw_output)?;
        state.serialize_field("Issues", &self.issues)?;
        state.serialize_field("IssueCount", &self.issue_count())?;
        if let Some(ref message) = self.error_message {
            state.serialize_field("ErrorMessage", message)?;
        }
        state.end()
    }
}
