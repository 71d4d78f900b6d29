//! Pipeline settings: built-in defaults, then `election.toml`, then
//! `ELECTION_*` environment variables. Command-line flags are applied on top
//! by the binary, which also loads `.env` through `load_env_file`.

use crate::enrich::gemini::DEFAULT_MODEL;
use crate::enrich::pool::DEFAULT_CONCURRENCY;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "election.toml";
pub const ENV_PREFIX: &str = "ELECTION_";
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const ENV_FILE: &str = ".env";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("{} is not set; add it to the environment or .env", API_KEY_VAR)]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the raw dataset files.
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub export_dir: PathBuf,
    /// Researched profiles, read during derivation and written by `enrich`.
    pub profiles_dir: PathBuf,
    pub prompt_path: PathBuf,
    pub model: String,
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("data"),
            database_path: PathBuf::from("data/election.db"),
            export_dir: PathBuf::from("public/data"),
            profiles_dir: PathBuf::from("data/candidates_history"),
            prompt_path: PathBuf::from("candidate_profile_researcher.md"),
            model: DEFAULT_MODEL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Settings {
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Layer `config_file` and the environment over the defaults. Callers
    /// load `.env` first so its variables take part.
    pub fn load_from(config_file: &Path) -> Result<Self> {
        Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::Figment(Box::new(e)))
    }
}

/// Load `path` into the process environment. No file is the usual case; a
/// file that cannot be parsed is logged and skipped.
pub fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!("loaded environment from {}", path.display());
            true
        }
        Err(e) if e.not_found() => {
            debug!("no {} file found", path.display());
            false
        }
        Err(e) => {
            warn!("ignoring {}: {}", path.display(), e);
            false
        }
    }
}

pub fn google_api_key() -> Result<String> {
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey)
}
