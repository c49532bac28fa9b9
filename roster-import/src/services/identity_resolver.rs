//! Identity resolver
//!
//! Decides between creating and refreshing the directory identity for a
//! record. Existence is checked by email; the update is addressed by the
//! uid the directory already holds.

use std::sync::Arc;

use crate::error::DirectoryError;
use crate::models::{IdentityAction, IdentityRecord, IdentityUpdate, ResolvedIdentity, UserRecord};
use crate::stores::IdentityDirectory;

pub struct IdentityResolver {
    directory: Arc<dyn IdentityDirectory>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    /// Existing identity for `email`, or `None` when the directory has none
    pub async fn lookup(&self, email: &str) -> Result<Option<IdentityRecord>, DirectoryError> {
        match self.directory.lookup_by_email(email).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create or update the identity for `user`
    ///
    /// The update rewrites uid, email, display name and credential of the
    /// existing identity. A blank name or password clears the stored value.
    pub async fn resolve(&self, user: &UserRecord) -> Result<ResolvedIdentity, DirectoryError> {
        match self.lookup(&user.email).await? {
            Some(existing) => {
                let fields = IdentityUpdate {
                    uid: Some(user.uid.clone()),
                    email: Some(user.email.clone()),
                    display_name: Some(user.display_name.clone().unwrap_or_default()),
                    credential: Some(user.password.clone().unwrap_or_default()),
                };
                let updated = self.directory.update(&existing.uid, &fields).await?;

                if existing.uid != updated.uid {
                    tracing::info!(
                        email = %user.email,
                        old_uid = %existing.uid,
                        uid = %updated.uid,
                        "Identity re-keyed"
                    );
                }
                Ok(ResolvedIdentity {
                    uid: updated.uid,
                    action: IdentityAction::Updated,
                })
            }
            None => {
                let record = IdentityRecord {
                    uid: user.uid.clone(),
                    email: user.email.clone(),
                    display_name: user.display_name.clone(),
                    credential: user.password.clone(),
                };
                let created = self.directory.create(&record).await?;
                Ok(ResolvedIdentity {
                    uid: created.uid,
                    action: IdentityAction::Created,
                })
            }
        }
    }
}
