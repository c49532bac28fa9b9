//! roster-import library interface
//!
//! Reconciles a batch of user records against the identity directory and
//! the profile store, uploading profile images along the way.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod source;
pub mod stores;

use std::sync::Arc;

use sqlx::SqlitePool;

use roster_common::events::EventBus;

use crate::config::{AssetMode, ImportConfig};
use crate::error::AssetTransferError;
use crate::services::{EngineOptions, ReconciliationEngine};
use crate::stores::{
    AssetTransfer, HttpAssetTransfer, LocalAssetTransfer, SqliteIdentityDirectory,
    SqliteProfileStore,
};

/// Asset transfer selected by `config.asset_mode`
pub fn build_asset_transfer(config: &ImportConfig) -> Result<Arc<dyn AssetTransfer>, AssetTransferError> {
    let transfer: Arc<dyn AssetTransfer> = match config.asset_mode {
        AssetMode::Local => Arc::new(LocalAssetTransfer::new(
            config.local_bucket_root.clone(),
            config.bucket.clone(),
            config.public_host.clone(),
        )),
        AssetMode::Http => Arc::new(HttpAssetTransfer::new(
            config.upload_endpoint.clone(),
            config.bucket.clone(),
            config.public_host.clone(),
            config.access_token.clone(),
        )?),
    };
    Ok(transfer)
}

/// Engine wired to the SQLite stores in `pool`
pub fn build_engine(
    pool: &SqlitePool,
    config: &ImportConfig,
    event_bus: EventBus,
) -> Result<ReconciliationEngine, AssetTransferError> {
    Ok(ReconciliationEngine::new(
        Arc::new(SqliteIdentityDirectory::new(pool.clone())),
        Arc::new(SqliteProfileStore::new(pool.clone())),
        build_asset_transfer(config)?,
        event_bus,
        EngineOptions {
            object_prefix: config.object_prefix.clone(),
        },
    ))
}
