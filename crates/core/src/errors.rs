use thiserror::Error;

/// Reasons the verification gate refuses a submission, distinguished so
/// the operator is told exactly which condition failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("a verification comment is required before submitting")]
    EmptyComment,
    #[error("the verification checkbox must be ticked before submitting")]
    NotConfirmed,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("comment exceeds the {limit}-character limit")]
    CommentTooLong { limit: usize },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no item is selected")]
    NoSelection,
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("a previous action is still in flight")]
    InFlight,
    #[error("{message}")]
    Submit { message: String },
}

/// Best-available failure message for a submit error: a concrete detail
/// from the transport/backend wins, otherwise a generic fallback built
/// from the action label.
pub fn submit_failure_message(detail: Option<&str>, action_label: &str) -> String {
    match detail.map(str::trim).filter(|detail| !detail.is_empty()) {
        Some(detail) => detail.to_string(),
        None => format!("Failed to {action_label}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{submit_failure_message, DispatchError, ValidationFailure};

    #[test]
    fn concrete_detail_wins_over_generic_fallback() {
        assert_eq!(
            submit_failure_message(Some("budget period is closed"), "Approve"),
            "budget period is closed"
        );
        assert_eq!(submit_failure_message(Some("   "), "Approve"), "Failed to Approve");
        assert_eq!(submit_failure_message(None, "Reject"), "Failed to Reject");
    }

    #[test]
    fn validation_failure_converts_into_dispatch_error() {
        let error = DispatchError::from(ValidationFailure::EmptyComment);
        assert!(matches!(error, DispatchError::Validation(ValidationFailure::EmptyComment)));
    }
}
