//! Data models for roster-import
//!
//! - Input rows and their validated form
//! - Identity directory records
//! - Profile payloads
//! - Per-record outcomes and the batch report

pub mod identity;
pub mod profile;
pub mod record;
pub mod report;

pub use identity::{IdentityAction, IdentityRecord, IdentityUpdate, ResolvedIdentity};
pub use profile::{MergeMode, ProfilePayload, ProfileWrite, TimestampField};
pub use record::{RawRecord, Role, UserRecord};
pub use report::{BatchReport, RecordFailure, RecordOutcome, RecordSuccess};
