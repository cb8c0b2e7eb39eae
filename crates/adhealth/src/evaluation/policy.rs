use super::domain::EvaluationStatus;

/// Folds a matched rule's status into the running status.
///
/// The rule status replaces the running status only when it is `Fail` or
/// the running status is still `Pass`. `Pass` rules never move the status.
/// This is not a plain maximum: once a `Warning` is recorded, later
/// `Warning` rules leave it alone and only `Fail` overrides it.
pub(crate) fn escalate(current: EvaluationStatus, matched: EvaluationStatus) -> EvaluationStatus {
    match matched {
        EvaluationStatus::Pass => current,
        EvaluationStatus::Fail => EvaluationStatus::Fail,
        EvaluationStatus::Warning if current == EvaluationStatus::Pass => EvaluationStatus::Warning,
        EvaluationStatus::Warning => current,
    }
}
