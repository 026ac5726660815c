//! Review workflow state machine for rule sets
//!
//! The legal transitions form a small fixed graph:
//!
//! ```text
//! draft -> pending_review -> approved
//!                         -> rejected
//! approved -> draft   (revert)
//! rejected -> draft   (revert)
//! ```
//!
//! There is no direct draft -> approved edge. [`ReviewStatus::can_transition`]
//! is the single source of truth; every mutation goes through it rather than
//! scattering status checks.
//!
//! The state machine defines preconditions only. Guarding two concurrent
//! approvals of the same pending set requires an atomic compare-and-set on
//! the stored status, which belongs to the persistence layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::UnderwritingError;
use crate::rules::model::RuleSet;

/// Review state of a rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// The transition table
    pub fn can_transition(self, to: ReviewStatus) -> bool {
        use ReviewStatus::*;
        matches!(
            (self, to),
            (Draft, PendingReview)
                | (PendingReview, Approved)
                | (PendingReview, Rejected)
                | (Approved, Draft)
                | (Rejected, Draft)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Draft => "draft",
            ReviewStatus::PendingReview => "pending_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl RuleSet {
    /// Guarded status change; every workflow method funnels through here
    fn transition(&mut self, to: ReviewStatus) -> Result<(), UnderwritingError> {
        if !self.review_status.can_transition(to) {
            return Err(UnderwritingError::InvalidState(format!(
                "rule set {} cannot move from {} to {}",
                self.id,
                self.review_status.as_str(),
                to.as_str()
            )));
        }
        self.review_status = to;
        Ok(())
    }

    /// Submit a draft set for review
    ///
    /// A set with zero rules is an authoring mistake, rejected as a
    /// configuration error before the transition is attempted.
    pub fn submit_for_review(&mut self) -> Result<(), UnderwritingError> {
        if self.rules.is_empty() {
            return Err(UnderwritingError::Configuration(format!(
                "rule set {} has no rules; add at least one before submitting",
                self.id
            )));
        }
        self.transition(ReviewStatus::PendingReview)
    }

    /// Approve a pending set, recording who approved it and when
    pub fn approve(&mut self, approver_id: u64) -> Result<(), UnderwritingError> {
        self.transition(ReviewStatus::Approved)?;
        self.reviewed_by = Some(approver_id);
        self.reviewed_at = Some(Utc::now());
        self.review_notes = None;
        Ok(())
    }

    /// Reject a pending set; a non-empty reason is mandatory and stored
    pub fn reject(&mut self, approver_id: u64, reason: &str) -> Result<(), UnderwritingError> {
        if reason.trim().is_empty() {
            return Err(UnderwritingError::Validation(
                "rejection requires a reason".to_string(),
            ));
        }
        self.transition(ReviewStatus::Rejected)?;
        self.reviewed_by = Some(approver_id);
        self.reviewed_at = Some(Utc::now());
        self.review_notes = Some(reason.to_string());
        Ok(())
    }

    /// Revert an approved or rejected set to draft, clearing decision
    /// metadata
    pub fn revert_to_draft(&mut self) -> Result<(), UnderwritingError> {
        self.transition(ReviewStatus::Draft)?;
        self.reviewed_by = None;
        self.reviewed_at = None;
        self.review_notes = None;
        Ok(())
    }
}
