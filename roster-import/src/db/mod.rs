//! Database access for roster-import
//!
//! Tables are created by `roster_common::db::init_database`; this module only
//! reads and writes the import-specific ones.

pub mod runs;
