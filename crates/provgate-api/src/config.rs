//! # Server Configuration
//!
//! Command-line flags, each also readable from a `PROVGATE_*` environment
//! variable. Parsed once in `main`, validated, then frozen into a
//! [`PipelineConfig`].

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use provgate_pipeline::{PipelineConfig, DEFAULT_MAX_UPLOAD_BYTES};
use thiserror::Error;

/// Upload gatekeeper for application archives.
///
/// Accepts archives on `PUT /upload`, stores them under their SHA-1 digest
/// and rejects those whose embedded provisioning manifests do not authorize
/// the expected application identifier.
#[derive(Parser, Debug, Clone)]
#[command(name = "provgate", version, about, long_about = None)]
pub struct Cli {
    /// Application identifier every manifest must authorize.
    #[arg(long, env = "PROVGATE_APPID", default_value = "")]
    pub appid: String,

    /// Directory uploads are stored in. Must already exist.
    #[arg(long, env = "PROVGATE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Log stored paths and decoded manifests.
    #[arg(long, env = "PROVGATE_DEBUG")]
    pub debug: bool,

    /// Address to listen on.
    #[arg(long, env = "PROVGATE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "PROVGATE_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: u64,

    /// Longest pause allowed between chunks of a request body, e.g. `10s`
    /// or `500ms`. A stalled upload is answered with 408.
    #[arg(long, env = "PROVGATE_REQUEST_TIMEOUT", default_value = "10s")]
    pub request_timeout: humantime::Duration,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("data directory {} does not exist", .0.display())]
    DataDirMissing(PathBuf),

    #[error("data directory {} is not a directory", .0.display())]
    DataDirNotADirectory(PathBuf),

    #[error("cannot inspect data directory {}: {source}", path.display())]
    DataDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Cli {
    /// Check the data directory and build the pipeline configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        check_data_dir(&self.data_dir)?;
        Ok(PipelineConfig::new(&self.data_dir, &self.appid)
            .with_debug(self.debug)
            .with_max_upload_bytes(Some(self.max_upload_bytes)))
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout.into()
    }
}

/// Fail unless `path` exists and is a directory.
pub fn check_data_dir(path: &Path) -> Result<(), ConfigError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::DataDirNotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ConfigError::DataDirMissing(path.to_path_buf()))
        }
        Err(source) => Err(ConfigError::DataDirUnreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
