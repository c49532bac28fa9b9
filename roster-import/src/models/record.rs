//! Input records
//!
//! `RawRecord` is the loosely typed row produced by the source reader.
//! `UserRecord` is the validated, role-tagged form consumed by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Column names understood by the normalizer
pub mod fields {
    pub const EMAIL: &str = "email";
    pub const UID: &str = "uid";
    pub const PASSWORD: &str = "password";
    pub const NAME: &str = "name";
    /// Accepted when `name` is absent
    pub const DISPLAY_NAME: &str = "displayName";
    pub const ROLE: &str = "role";
    pub const IMAGE_PATH: &str = "imagePath";
    pub const DEPARTMENT: &str = "department";
    pub const BRANCH: &str = "branch";
    pub const COURSE: &str = "course";
}

/// Role → attribute names meaningful for that role
///
/// Roles not listed here carry base fields only.
const ROLE_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("student", &["year", "semester"]),
    ("teacher", &["designation"]),
    ("company", &["company_type", "company_location"]),
];

/// One row from the tabular source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based line in the source file (header is line 1)
    pub line_number: usize,
    pub fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(line_number: usize) -> Self {
        Self {
            line_number,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Trimmed value for `key`; `None` when the column is absent or blank
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Account role, selecting which attribute group a profile carries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Teacher,
    Company,
    /// Any other value (including empty); stored verbatim, no extra attributes
    Other(String),
}

impl Role {
    /// Exact match on the trimmed role text
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "student" => Role::Student,
            "teacher" => Role::Teacher,
            "company" => Role::Company,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Company => "company",
            Role::Other(value) => value,
        }
    }

    /// Attribute names carried by profiles of this role
    pub fn attribute_names(&self) -> &'static [&'static str] {
        if let Role::Other(_) = self {
            return &[];
        }
        ROLE_ATTRIBUTES
            .iter()
            .find(|(role, _)| *role == self.as_str())
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub line_number: usize,
    /// Natural key, used for directory lookup
    pub email: String,
    /// Store primary key, caller-supplied
    pub uid: String,
    /// Plaintext credential; `None` when the cell is blank
    pub password: Option<String>,
    /// `None` when both name columns are blank
    pub display_name: Option<String>,
    pub role: Role,
    pub department: String,
    pub branch: String,
    pub course: String,
    /// Local media file to upload
    pub image_path: Option<PathBuf>,
    /// Exactly the attributes named by `role.attribute_names()`
    pub role_attributes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_trims_and_hides_blank_values() {
        let raw = RawRecord::new(2)
            .with_field("email", "  a@x.com ")
            .with_field("uid", "   ");

        assert_eq!(raw.get("email"), Some("a@x.com"));
        assert_eq!(raw.get("uid"), None);
        assert_eq!(raw.get("missing"), None);
    }

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::parse("student"), Role::Student);
        assert_eq!(Role::parse(" teacher "), Role::Teacher);
        assert_eq!(Role::parse("company"), Role::Company);
        assert_eq!(Role::parse("Student"), Role::Other("Student".to_string()));
        assert_eq!(Role::parse(""), Role::Other(String::new()));
    }

    #[test]
    fn test_role_attribute_table() {
        assert_eq!(Role::Student.attribute_names(), &["year", "semester"]);
        assert_eq!(Role::Teacher.attribute_names(), &["designation"]);
        assert_eq!(Role::Company.attribute_names(), &["company_type", "company_location"]);
        assert!(Role::Other("admin".to_string()).attribute_names().is_empty());
    }

    #[test]
    fn test_other_role_named_like_known_role_has_no_attributes() {
        // Other("student") cannot come out of parse, but must not borrow the student schema
        assert!(Role::Other("student".to_string()).attribute_names().is_empty());
    }
}
