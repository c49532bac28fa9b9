//! Startup logging
//!
//! Config loading happens before the process subscriber exists, so it runs
//! under a scoped stderr subscriber. The process subscriber is installed once
//! the config has decided the level and destination.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use roster_common::config::{load_toml_config, TomlConfig};
use roster_common::Result;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};
use tracing_subscriber::EnvFilter;

/// Load `roster.toml`, reporting to stderr; defaults when `path` is `None`
pub fn load_startup_config(path: Option<&Path>) -> Result<TomlConfig> {
    load_startup_config_with_writer(path, std::io::stderr)
}

/// `load_startup_config` with an explicit writer for the bootstrap subscriber
pub fn load_startup_config_with_writer<W>(path: Option<&Path>, writer: W) -> Result<TomlConfig>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };

    let bootstrap = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(bootstrap, || load_toml_config(path))
}

/// Writer for the configured log file, or stderr when none is set
///
/// The log file is opened for append; missing parent directories are created.
pub fn log_writer(toml_config: &TomlConfig) -> Result<BoxMakeWriter> {
    let Some(path) = toml_config.log_file() else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

/// Install the process subscriber
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(toml_config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(toml_config.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_writer(toml_config)?)
        .init();
    Ok(())
}
