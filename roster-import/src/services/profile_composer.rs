//! Profile composer
//!
//! Pure mapping from a normalized record to the profile write for its uid.

use serde_json::{Map, Value};

use crate::models::profile::keys;
use crate::models::{
    IdentityAction, MergeMode, ProfilePayload, ProfileWrite, ResolvedIdentity, TimestampField,
    UserRecord,
};

/// Build the profile write for `user`
///
/// A created identity gets a full document stamped `createdAt`; an updated
/// one gets a partial merge stamped `updatedAt`. `imageUrl` is always
/// present, null when no image was attached.
pub fn compose(user: &UserRecord, image_url: Option<&str>, identity: &ResolvedIdentity) -> ProfileWrite {
    let mut fields = Map::new();
    fields.insert(keys::EMAIL.to_string(), Value::from(user.email.as_str()));
    fields.insert(keys::ROLE.to_string(), Value::from(user.role.as_str()));
    fields.insert(keys::UID.to_string(), Value::from(identity.uid.as_str()));
    fields.insert(
        keys::IMAGE_URL.to_string(),
        image_url.map(Value::from).unwrap_or(Value::Null),
    );
    fields.insert(keys::DEPARTMENT.to_string(), Value::from(user.department.as_str()));
    fields.insert(keys::BRANCH.to_string(), Value::from(user.branch.as_str()));
    fields.insert(keys::COURSE.to_string(), Value::from(user.course.as_str()));

    for (name, value) in &user.role_attributes {
        fields.insert(name.clone(), Value::from(value.as_str()));
    }

    let (timestamp_field, mode) = match identity.action {
        IdentityAction::Created => (TimestampField::CreatedAt, MergeMode::Full),
        IdentityAction::Updated => (TimestampField::UpdatedAt, MergeMode::Partial),
    };

    ProfileWrite {
        uid: identity.uid.clone(),
        payload: ProfilePayload {
            fields,
            timestamp_field,
        },
        mode,
    }
}
