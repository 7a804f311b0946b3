//! Configuration management for the XPS server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::document::default_max_jobs;

/// Default request body limit: 256 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub jobs: JobConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Scratch area for uploaded documents
    pub upload_dir: PathBuf,
    /// Scratch area for generated artifacts
    pub result_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Backend jobs allowed to run at the same time
    pub max_concurrent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                result_dir: PathBuf::from("results"),
            },
            jobs: JobConfig {
                max_concurrent: default_max_jobs(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// Unset variables take their defaults; set but unparsable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or(defaults.server.port),
                max_upload_bytes: parse_var(&lookup, "XPS_MAX_UPLOAD_BYTES")?
                    .unwrap_or(defaults.server.max_upload_bytes),
            },
            storage: StorageConfig {
                upload_dir: lookup("XPS_UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                result_dir: lookup("XPS_RESULT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.result_dir),
            },
            jobs: JobConfig {
                max_concurrent: parse_var(&lookup, "XPS_MAX_CONCURRENT_JOBS")?
                    .unwrap_or(defaults.jobs.max_concurrent),
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
