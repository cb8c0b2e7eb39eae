use super::condition::condition_matches;
use super::domain::{CheckDefinition, EvaluationStatus, Issue, IssueId};
use super::policy::escalate;
use super::record::RawOutput;
use super::resolvers::{affected_object, severity_from_status};
use super::thresholds::ThresholdSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One condition/status pair of a check's rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationRule {
    pub condition: String,
    pub status: EvaluationStatus,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Ordered rules attached to a check definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<EvaluationRule>,
}

impl RuleSet {
    pub fn from_json_str(encoded: &str) -> Result<Self, RuleSetError> {
        serde_json::from_str(encoded).map_err(RuleSetError::Malformed)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, RuleSetError> {
        Self::deserialize(value).map_err(RuleSetError::Malformed)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rule set configuration that cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("malformed evaluation rules: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Runs every rule in declaration order and folds matches into one status.
pub(crate) fn apply_rules(
    definition: &CheckDefinition,
    rules: &RuleSet,
    output: &RawOutput,
    thresholds: &ThresholdSet,
) -> (EvaluationStatus, Vec<Issue>) {
    let mut status = EvaluationStatus::Pass;
    let mut issues = Vec::new();

    for rule in &rules.rules {
        if !condition_matches(&rule.condition, output, thresholds) {
            continue;
        }

        status = escalate(status, rule.status);

        if rule.status != EvaluationStatus::Pass {
            issues.push(Issue {
                issue_id: IssueId::next(),
                severity: severity_from_status(rule.status.as_str(), definition.severity),
                title: rule.title.clone(),
                description: rule.description.clone(),
                affected_object: affected_object(output, Some(rule)),
                evidence: output.to_value(),
                recommendation: definition.remediation_steps.clone(),
            });
        }
    }

    (status, issues)
}
