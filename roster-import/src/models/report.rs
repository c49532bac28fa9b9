//! Per-record outcomes and the batch summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FailureKind;
use crate::models::IdentityAction;

/// A record reconciled against both stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSuccess {
    pub line_number: usize,
    pub email: String,
    pub uid: String,
    pub action: IdentityAction,
    pub image_url: Option<String>,
}

/// A record that failed; earlier store writes for it are not rolled back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub line_number: usize,
    /// None when the record had no email
    pub email: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

pub type RecordOutcome = Result<RecordSuccess, RecordFailure>;

/// Summary of one batch run
///
/// Successes are counted; failures are listed individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    /// Where the records came from (file path or label)
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Records handed to the engine
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Records skipped because the run was cancelled first
    pub not_attempted: usize,

    /// Successful records that created a new identity
    pub created: usize,
    /// Successful records that refreshed an existing identity
    pub updated: usize,
    /// Successful records whose profile got an image URL
    pub images_attached: usize,

    pub cancelled: bool,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn new(source: impl Into<String>, submitted: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.into(),
            started_at: Utc::now(),
            ended_at: None,
            submitted,
            succeeded: 0,
            failed: 0,
            not_attempted: 0,
            created: 0,
            updated: 0,
            images_attached: 0,
            cancelled: false,
            failures: Vec::new(),
        }
    }

    /// Fold one record outcome into the counters
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            Ok(success) => {
                self.succeeded += 1;
                match success.action {
                    IdentityAction::Created => self.created += 1,
                    IdentityAction::Updated => self.updated += 1,
                }
                if success.image_url.is_some() {
                    self.images_attached += 1;
                }
            }
            Err(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }

    /// Close the report; records never reached count as not attempted
    pub fn finish(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
        self.not_attempted = self.submitted.saturating_sub(self.attempted());
        self.ended_at = Some(Utc::now());
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn duration_ms(&self) -> u64 {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }

    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}
