//! Run configuration for roster-import
//!
//! Every setting resolves with priority CLI → environment → TOML → default.

use std::path::{Path, PathBuf};

use roster_common::config::{
    CompiledDefaults, LoggingConfig, SourceConfig, StorageConfig, TomlConfig,
};
use roster_common::{Error, Result};
use tracing::{info, warn};

use crate::services::asset_associator::DEFAULT_OBJECT_PREFIX;
use crate::source::{parse_delimiter, DEFAULT_DELIMITER};

pub const DELIMITER_ENV: &str = "ROSTER_DELIMITER";
pub const ASSET_MODE_ENV: &str = "ROSTER_ASSET_MODE";
pub const BUCKET_ENV: &str = "ROSTER_BUCKET";
pub const PUBLIC_HOST_ENV: &str = "ROSTER_PUBLIC_HOST";
pub const UPLOAD_ENDPOINT_ENV: &str = "ROSTER_UPLOAD_ENDPOINT";
pub const OBJECT_PREFIX_ENV: &str = "ROSTER_OBJECT_PREFIX";
pub const ACCESS_TOKEN_ENV: &str = "ROSTER_ACCESS_TOKEN";

pub const DEFAULT_BUCKET: &str = "roster-assets";
pub const DEFAULT_PUBLIC_HOST: &str = "firebasestorage.googleapis.com";
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://storage.googleapis.com";

/// Local bucket directory, relative to the root folder
pub const LOCAL_BUCKET_DIR: &str = "assets";

/// Where uploaded images are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AssetMode {
    /// Copy into `<root>/assets/<bucket>`
    #[default]
    Local,
    /// Object storage media upload API
    Http,
}

impl AssetMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(AssetMode::Local),
            "http" => Some(AssetMode::Http),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetMode::Local => "local",
            AssetMode::Http => "http",
        }
    }
}

/// Settings given on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub delimiter: Option<String>,
    pub bucket: Option<String>,
    pub asset_mode: Option<AssetMode>,
}

/// Effective settings for one import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub delimiter: u8,
    pub asset_mode: AssetMode,
    pub bucket: String,
    pub public_host: String,
    pub upload_endpoint: String,
    pub object_prefix: String,
    pub access_token: Option<String>,
    /// Bucket directory for `AssetMode::Local`
    pub local_bucket_root: PathBuf,
}

impl ImportConfig {
    /// Resolve from CLI overrides, process environment and TOML
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig, root_folder: &Path) -> Result<Self> {
        Self::resolve_with_env(cli, toml, root_folder, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with_env(
        cli: &CliOverrides,
        toml: &TomlConfig,
        root_folder: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let storage = &toml.storage;

        let delimiter = match first_of(&[
            cli.delimiter.clone(),
            env(DELIMITER_ENV),
            toml.source.delimiter.clone(),
        ]) {
            Some(value) => parse_delimiter(&value).ok_or_else(|| {
                Error::Config(format!("Invalid delimiter {:?}: expected a single ASCII character", value))
            })?,
            None => DEFAULT_DELIMITER,
        };

        let asset_mode = match cli.asset_mode {
            Some(mode) => mode,
            None => match first_of(&[env(ASSET_MODE_ENV), storage.mode.clone()]) {
                Some(value) => AssetMode::parse(&value).ok_or_else(|| {
                    Error::Config(format!("Invalid asset mode {:?}: expected \"local\" or \"http\"", value))
                })?,
                None => AssetMode::default(),
            },
        };

        let bucket = first_of(&[cli.bucket.clone(), env(BUCKET_ENV), storage.bucket.clone()])
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());

        let public_host = first_of(&[env(PUBLIC_HOST_ENV), storage.public_host.clone()])
            .unwrap_or_else(|| DEFAULT_PUBLIC_HOST.to_string());

        let upload_endpoint = first_of(&[env(UPLOAD_ENDPOINT_ENV), storage.upload_endpoint.clone()])
            .unwrap_or_else(|| DEFAULT_UPLOAD_ENDPOINT.to_string());

        let object_prefix = first_of(&[env(OBJECT_PREFIX_ENV), storage.object_prefix.clone()])
            .unwrap_or_else(|| DEFAULT_OBJECT_PREFIX.to_string());

        let access_token = resolve_access_token(env(ACCESS_TOKEN_ENV), storage.access_token.clone());
        if asset_mode == AssetMode::Http && access_token.is_none() {
            warn!("No upload access token configured; uploads will be sent unauthenticated");
        }

        Ok(Self {
            delimiter,
            asset_mode,
            local_bucket_root: root_folder.join(LOCAL_BUCKET_DIR).join(&bucket),
            bucket,
            public_host,
            upload_endpoint,
            object_prefix,
            access_token,
        })
    }
}

/// `roster.toml` with every default written out, for `init-config`
///
/// The access token is left unset so it can come from the environment.
pub fn starter_toml_config(root_folder: &Path) -> TomlConfig {
    let defaults = CompiledDefaults::for_current_platform();
    TomlConfig {
        root_folder: Some(root_folder.to_path_buf()),
        logging: LoggingConfig {
            level: Some(defaults.log_level),
            file: defaults.log_file,
        },
        storage: StorageConfig {
            mode: Some(AssetMode::default().as_str().to_string()),
            bucket: Some(DEFAULT_BUCKET.to_string()),
            public_host: Some(DEFAULT_PUBLIC_HOST.to_string()),
            upload_endpoint: Some(DEFAULT_UPLOAD_ENDPOINT.to_string()),
            object_prefix: Some(DEFAULT_OBJECT_PREFIX.to_string()),
            access_token: None,
        },
        source: SourceConfig {
            delimiter: Some((DEFAULT_DELIMITER as char).to_string()),
        },
    }
}

/// First non-blank candidate
fn first_of(candidates: &[Option<String>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Access token: environment → TOML, warning when both are set
fn resolve_access_token(env_token: Option<String>, toml_token: Option<String>) -> Option<String> {
    let env_token = env_token.filter(|t| !t.trim().is_empty());
    let toml_token = toml_token.filter(|t| !t.trim().is_empty());

    if env_token.is_some() && toml_token.is_some() {
        warn!("Upload access token found in multiple sources: environment, TOML. Using environment (highest priority).");
    }

    if let Some(token) = env_token {
        info!("Upload access token loaded from environment variable");
        return Some(token);
    }
    if let Some(token) = toml_token {
        info!("Upload access token loaded from TOML config");
        return Some(token);
    }
    None
}
