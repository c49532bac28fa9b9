//! Reconciliation services
//!
//! The normalizer and composer are pure; the associator and resolver wrap the
//! injected stores; the engine sequences all four per record.

pub mod asset_associator;
pub mod identity_resolver;
pub mod normalizer;
pub mod profile_composer;
pub mod reconciler;

pub use asset_associator::AssetAssociator;
pub use identity_resolver::IdentityResolver;
pub use normalizer::normalize;
pub use profile_composer::compose;
pub use reconciler::{EngineOptions, ReconciliationEngine};
