use std::collections::HashSet;

use serde::Serialize;

use super::condition::Condition;
use super::domain::{CheckDefinition, CheckId};

/// Authoring problem found in a check definition's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleProblem {
    pub check_id: CheckId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<usize>,
    pub message: String,
}

impl RuleProblem {
    fn check(check_id: &CheckId, message: String) -> Self {
        Self {
            check_id: check_id.clone(),
            rule_index: None,
            message,
        }
    }

    fn rule(check_id: &CheckId, index: usize, message: String) -> Self {
        Self {
            check_id: check_id.clone(),
            rule_index: Some(index),
            message,
        }
    }
}

/// Reports rule sets that would silently degrade at evaluation time.
///
/// Evaluation itself tolerates every problem listed here: malformed rule
/// sets fall back to the default classifier and unparsable conditions never
/// match. This pass surfaces them to rule authors instead.
pub fn validate_definitions(definitions: &[CheckDefinition]) -> Vec<RuleProblem> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for definition in definitions {
        let check_id = &definition.check_id;

        if !seen.insert(check_id) {
            problems.push(RuleProblem::check(
                check_id,
                "duplicate CheckId; the later definition replaces the earlier one".to_string(),
            ));
        }

        let rules = match definition.rule_set() {
            None => continue,
            Some(Err(err)) => {
                problems.push(RuleProblem::check(check_id, err.to_string()));
                continue;
            }
            Some(Ok(rules)) => rules,
        };

        for (index, rule) in rules.rules.iter().enumerate() {
            if let Err(err) = Condition::parse(&rule.condition) {
                problems.push(RuleProblem::rule(
                    check_id,
                    index,
                    format!("condition '{}' does not parse: {err}", rule.condition),
                ));
            }
            if rule.title.trim().is_empty() {
                problems.push(RuleProblem::rule(
                    check_id,
                    index,
                    "rule has no Title; issues it raises will be untitled".to_string(),
                ));
            }
        }
    }

    problems
}
