//! Identity directory records

use serde::{Deserialize, Serialize};

/// Identity as seen by the directory
///
/// `credential` carries plaintext on the way in. Directories never return it,
/// so records read back have `credential: None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub credential: Option<String>,
}

/// Partial identity fields for `IdentityDirectory::update`
///
/// `None` fields are left unchanged by the directory; an empty display name
/// or credential clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityUpdate {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub credential: Option<String>,
}

/// Which branch the identity resolver took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityAction {
    Created,
    Updated,
}

impl IdentityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityAction::Created => "created",
            IdentityAction::Updated => "updated",
        }
    }
}

/// Outcome of identity resolution: the key used for the profile write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub uid: String,
    pub action: IdentityAction,
}
