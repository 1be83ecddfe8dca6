use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::sync::transfer::{DEFAULT_DOWNLOAD_TIMEOUT, TransferConfig};

pub const EMAIL_VAR: &str = "SEEDRCC_EMAIL";
pub const PASSWORD_VAR: &str = "SEEDRCC_PASSWORD";

const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("current directory is unavailable: {0}")]
    CurrentDir(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub output_root: PathBuf,
    /// Upper bound on transfers (and deletions) in flight at once.
    pub concurrency: usize,
    pub download_timeout: Duration,
    pub discard_partial: bool,
    pub verbose: bool,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let output_root = match std::env::var("SEEDR_SYNC_OUTPUT") {
            Ok(value) if !value.is_empty() => PathBuf::from(value),
            _ => std::env::current_dir()?,
        };
        let concurrency = read_usize_env("SEEDR_SYNC_CONCURRENCY", DEFAULT_CONCURRENCY);
        let download_timeout = Duration::from_secs(read_u64_env(
            "SEEDR_SYNC_TIMEOUT_SECS",
            DEFAULT_DOWNLOAD_TIMEOUT.as_secs(),
        ));
        let discard_partial = read_bool_env("SEEDR_SYNC_DISCARD_PARTIAL", false);

        Ok(Self {
            output_root,
            concurrency,
            download_timeout,
            discard_partial,
            verbose: false,
        })
    }

    pub fn transfer(&self) -> TransferConfig {
        TransferConfig {
            timeout: self.download_timeout,
            discard_partial: self.discard_partial,
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            email: read_required(EMAIL_VAR)?,
            password: read_required(PASSWORD_VAR)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn read_required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}

fn read_u64_env(name: &str, default: u64) -> u64 {
    parse_positive(std::env::var(name).ok().as_deref()).unwrap_or(default)
}

fn read_usize_env(name: &str, default: usize) -> usize {
    parse_positive(std::env::var(name).ok().as_deref())
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn read_bool_env(name: &str, default: bool) -> bool {
    parse_bool(std::env::var(name).ok().as_deref()).unwrap_or(default)
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
