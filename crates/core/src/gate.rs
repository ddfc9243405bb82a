//! The mandatory checkbox-plus-comment confirmation required before any
//! mutating action. The gate is the authoritative guard; a disabled
//! button in the UI is only a nicety on top of it.

use serde::{Deserialize, Serialize};

use crate::errors::{GateError, ValidationFailure};

pub const DEFAULT_COMMENT_MAX_LEN: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationGate {
    verified: bool,
    comment: String,
    comment_max_len: usize,
}

impl Default for VerificationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COMMENT_MAX_LEN)
    }
}

impl VerificationGate {
    pub fn new(comment_max_len: usize) -> Self {
        Self { verified: false, comment: String::new(), comment_max_len }
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_verified(&mut self, verified: bool) {
        self.verified = verified;
    }

    /// Rejects input beyond the module's comment limit outright rather
    /// than truncating it after the fact.
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<(), GateError> {
        let comment = comment.into();
        if comment.chars().count() > self.comment_max_len {
            return Err(GateError::CommentTooLong { limit: self.comment_max_len });
        }
        self.comment = comment;
        Ok(())
    }

    /// Back to `{unverified, empty}`; runs on every new selection and
    /// after a successful dispatch cycle.
    pub fn reset(&mut self) {
        self.verified = false;
        self.comment.clear();
    }

    /// The comment condition is reported first when both fail.
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        if self.comment.trim().is_empty() {
            return Err(ValidationFailure::EmptyComment);
        }
        if !self.verified {
            return Err(ValidationFailure::NotConfirmed);
        }
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }
}
