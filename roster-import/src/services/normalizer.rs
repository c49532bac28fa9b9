//! Record normalizer
//!
//! Turns a raw source row into a `UserRecord`. Pure: no I/O.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ValidationError;
use crate::models::record::fields;
use crate::models::{RawRecord, Role, UserRecord};

/// Validate required fields and pick the active role's attribute group
///
/// Fails when `email` or `uid` is missing or blank. Attributes belonging to
/// other roles are dropped; attributes of the active role that are missing in
/// the row become empty strings.
pub fn normalize(raw: &RawRecord) -> Result<UserRecord, ValidationError> {
    let email = raw
        .get(fields::EMAIL)
        .ok_or(ValidationError::MissingField(fields::EMAIL))?;
    let uid = raw
        .get(fields::UID)
        .ok_or(ValidationError::MissingField(fields::UID))?;

    let role = Role::parse(raw.get(fields::ROLE).unwrap_or_default());
    let role_attributes: BTreeMap<String, String> = role
        .attribute_names()
        .iter()
        .map(|name| (name.to_string(), raw.get(name).unwrap_or_default().to_string()))
        .collect();

    Ok(UserRecord {
        line_number: raw.line_number,
        email: email.to_string(),
        uid: uid.to_string(),
        password: raw.get(fields::PASSWORD).map(str::to_string),
        display_name: raw
            .get(fields::NAME)
            .or_else(|| raw.get(fields::DISPLAY_NAME))
            .map(str::to_string),
        role,
        department: text(raw, fields::DEPARTMENT),
        branch: text(raw, fields::BRANCH),
        course: text(raw, fields::COURSE),
        image_path: raw.get(fields::IMAGE_PATH).map(PathBuf::from),
        role_attributes,
    })
}

fn text(raw: &RawRecord, key: &str) -> String {
    raw.get(key).unwrap_or_default().to_string()
}
