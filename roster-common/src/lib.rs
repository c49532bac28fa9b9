//! # Roster Common Library
//!
//! Shared code for the roster reconciliation tools:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Event types (RosterEvent enum) and EventBus
//! - Database bootstrap
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
