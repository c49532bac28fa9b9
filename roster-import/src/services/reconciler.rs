//! Reconciliation engine
//!
//! Drives records through normalize → asset → identity → profile, one record
//! at a time in input order. Every per-record error stops at the record
//! boundary and becomes a `RecordFailure` in the batch report; the run itself
//! only ends early when cancelled.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use roster_common::events::{EventBus, RosterEvent};

use super::asset_associator::{AssetAssociator, DEFAULT_OBJECT_PREFIX};
use super::identity_resolver::IdentityResolver;
use super::normalizer::normalize;
use super::profile_composer::compose;
use crate::error::RecordError;
use crate::models::record::fields;
use crate::models::{BatchReport, RawRecord, RecordFailure, RecordOutcome, RecordSuccess};
use crate::stores::{AssetTransfer, IdentityDirectory, ProfileStore};

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Object name prefix for uploaded images
    pub object_prefix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
        }
    }
}

pub struct ReconciliationEngine {
    asset_associator: AssetAssociator,
    identity_resolver: IdentityResolver,
    profiles: Arc<dyn ProfileStore>,
    event_bus: EventBus,
}

impl ReconciliationEngine {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        profiles: Arc<dyn ProfileStore>,
        assets: Arc<dyn AssetTransfer>,
        event_bus: EventBus,
        options: EngineOptions,
    ) -> Self {
        Self {
            asset_associator: AssetAssociator::new(assets, options.object_prefix),
            identity_resolver: IdentityResolver::new(directory),
            profiles,
            event_bus,
        }
    }

    /// Reconcile `records` in order and summarize the batch
    ///
    /// `cancel` is checked before each record. Records not reached are
    /// reported as not attempted.
    pub async fn run(
        &self,
        source: &str,
        records: Vec<RawRecord>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::new(source, records.len());
        let run_id = report.run_id;

        tracing::info!(run_id = %run_id, source = %source, records = records.len(), "Starting roster import");
        self.event_bus.emit_lossy(RosterEvent::BatchStarted {
            run_id,
            total_records: records.len(),
            timestamp: Utc::now(),
        });

        let mut cancelled = false;
        for raw in &records {
            if cancel.is_cancelled() {
                tracing::warn!(run_id = %run_id, line = raw.line_number, "Import cancelled, stopping before record");
                cancelled = true;
                break;
            }

            let outcome = self.reconcile_record(raw).await;
            self.announce(run_id, &outcome);
            report.record(outcome);
        }

        report.finish(cancelled);

        tracing::info!(
            run_id = %run_id,
            succeeded = report.succeeded,
            failed = report.failed,
            not_attempted = report.not_attempted,
            duration_ms = report.duration_ms(),
            "Roster import finished"
        );
        self.event_bus.emit_lossy(RosterEvent::BatchCompleted {
            run_id,
            succeeded: report.succeeded,
            failed: report.failed,
            not_attempted: report.not_attempted,
            cancelled: report.cancelled,
            duration_ms: report.duration_ms(),
            timestamp: Utc::now(),
        });

        report
    }

    /// Process one record through every stage
    pub async fn reconcile_record(&self, raw: &RawRecord) -> RecordOutcome {
        match self.process(raw).await {
            Ok(success) => {
                tracing::info!(
                    line = success.line_number,
                    email = %success.email,
                    uid = %success.uid,
                    action = success.action.as_str(),
                    "Record reconciled"
                );
                Ok(success)
            }
            Err(e) => {
                let failure = RecordFailure {
                    line_number: raw.line_number,
                    email: raw.get(fields::EMAIL).map(str::to_string),
                    kind: e.kind(),
                    message: e.to_string(),
                };
                tracing::error!(
                    line = failure.line_number,
                    email = failure.email.as_deref().unwrap_or("<none>"),
                    kind = %failure.kind,
                    error = %failure.message,
                    "Record failed"
                );
                Err(failure)
            }
        }
    }

    async fn process(&self, raw: &RawRecord) -> Result<RecordSuccess, RecordError> {
        let user = normalize(raw)?;

        let image_url = self
            .asset_associator
            .resolve(&user.email, user.image_path.as_deref())
            .await;

        let identity = self.identity_resolver.resolve(&user).await?;

        let write = compose(&user, image_url.as_deref(), &identity);
        self.profiles
            .upsert(&write.uid, &write.payload, write.mode)
            .await?;

        Ok(RecordSuccess {
            line_number: user.line_number,
            email: user.email,
            uid: identity.uid,
            action: identity.action,
            image_url,
        })
    }

    fn announce(&self, run_id: uuid::Uuid, outcome: &RecordOutcome) {
        let event = match outcome {
            Ok(success) => RosterEvent::RecordReconciled {
                run_id,
                line_number: success.line_number,
                email: success.email.clone(),
                uid: success.uid.clone(),
                action: success.action.as_str().to_string(),
                image_attached: success.image_url.is_some(),
                timestamp: Utc::now(),
            },
            Err(failure) => RosterEvent::RecordFailed {
                run_id,
                line_number: failure.line_number,
                email: failure.email.clone(),
                kind: failure.kind.as_str().to_string(),
                message: failure.message.clone(),
                timestamp: Utc::now(),
            },
        };
        self.event_bus.emit_lossy(event);
    }
}
