//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Akuntabel has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Directory-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (applied with [`Config::apply_overrides`])
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$AKUNTABEL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/akuntabel/config.toml`
//! 3. `~/.akuntabel/config.toml` (canonical write location)
//!
//! # Project Config Locations
//!
//! `.akuntabel/config.toml` under the project directory.
//!
//! # Example
//!
//! ```no_run
//! use akuntabel::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//!
//! println!("RPC: {}", config.rpc_url());
//! if let Some(contract) = config.contract() {
//!     println!("Contract: {}", contract);
//! }
//! ```

pub mod schema;

pub use schema::{FileConfig, IdentityConfig, TxConfig, WebConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::identity::NonceStrategy;
use crate::core::types::Address;

/// Default JSON-RPC endpoint (local development node).
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default front end URL.
pub const DEFAULT_WEB_BASE_URL: &str = "http://localhost:3000";

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 60;

/// Keys accepted by [`FileConfig::get_key`] and [`FileConfig::set_key`].
pub const KNOWN_KEYS: &[&str] = &[
    "rpc_url",
    "contract",
    "account",
    "tx.poll_interval_ms",
    "tx.receipt_timeout_secs",
    "identity.nonce_strategy",
    "web.base_url",
];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key '{0}'")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically: overrides, then project, then
/// global, then defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Project configuration (if found)
    pub project: Option<FileConfig>,
    /// CLI flag overrides
    overrides: FileConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads project-specific config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<Config, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), project_dir)
    }

    /// Load configuration with an explicit global config path.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Config, ConfigError> {
        let (global, global_path) = match global_path {
            Some(path) if path.exists() => (Self::read_config(path)?, Some(path.to_path_buf())),
            _ => (FileConfig::default(), None),
        };

        let (project, project_path) = match project_dir {
            Some(dir) => Self::load_project(dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        Ok(Config {
            global,
            project,
            overrides: FileConfig::default(),
            global_path,
            project_path,
        })
    }

    /// Find the global config file in standard locations.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $AKUNTABEL_CONFIG
        if let Ok(path) = std::env::var("AKUNTABEL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/akuntabel/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("akuntabel/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.akuntabel/config.toml
        let path = dirs::home_dir()?.join(".akuntabel/config.toml");
        path.exists().then_some(path)
    }

    /// Load project configuration, if the project has any.
    fn load_project(dir: &Path) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::project_config_path(dir);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path global config is written to.
    ///
    /// Returns `$AKUNTABEL_CONFIG` if set, otherwise `~/.akuntabel/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("AKUNTABEL_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".akuntabel/config.toml"))
    }

    /// Get the canonical path for project config.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(".akuntabel/config.toml")
    }

    /// Write global config atomically.
    pub fn write_global(config: &FileConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write project config atomically.
    pub fn write_project(dir: &Path, config: &FileConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::project_config_path(dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically (temp file, then rename).
    pub fn write_config_atomic(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Apply CLI flag overrides (highest precedence).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if an override is invalid.
    pub fn apply_overrides(
        &mut self,
        rpc_url: Option<&str>,
        contract: Option<&str>,
        account: Option<&str>,
    ) -> Result<(), ConfigError> {
        let overrides = FileConfig {
            rpc_url: rpc_url.map(str::to_string),
            contract: contract.map(str::to_string),
            account: account.map(str::to_string),
            ..Default::default()
        };
        overrides.validate()?;
        self.overrides = overrides;
        Ok(())
    }

    /// Resolve a value through overrides, project, and global scopes.
    fn resolve<'a, T: ?Sized>(&'a self, get: impl Fn(&'a FileConfig) -> Option<&'a T>) -> Option<&'a T> {
        get(&self.overrides)
            .or_else(|| self.project.as_ref().and_then(&get))
            .or_else(|| get(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the JSON-RPC endpoint.
    ///
    /// Defaults to the local development node.
    pub fn rpc_url(&self) -> &str {
        self.resolve(|c| c.rpc_url.as_deref())
            .unwrap_or(DEFAULT_RPC_URL)
    }

    /// Get the contract address, if configured.
    pub fn contract(&self) -> Option<Address> {
        self.resolve(|c| c.contract.as_deref())
            .and_then(|s| Address::parse(s).ok())
    }

    /// Get the sending account, if configured.
    pub fn account(&self) -> Option<Address> {
        self.resolve(|c| c.account.as_deref())
            .and_then(|s| Address::parse(s).ok())
    }

    /// Delay between transaction receipt polls.
    ///
    /// Defaults to 500ms.
    pub fn poll_interval(&self) -> Duration {
        let ms = self
            .resolve(|c| c.tx.as_ref().and_then(|t| t.poll_interval_ms.as_ref()))
            .copied()
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    /// How long to wait for a transaction receipt.
    ///
    /// Defaults to 60s.
    pub fn receipt_timeout(&self) -> Duration {
        let secs = self
            .resolve(|c| c.tx.as_ref().and_then(|t| t.receipt_timeout_secs.as_ref()))
            .copied()
            .unwrap_or(DEFAULT_RECEIPT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// How the id of a just-created goal is derived.
    ///
    /// Defaults to [`NonceStrategy::Refetch`].
    pub fn nonce_strategy(&self) -> NonceStrategy {
        self.resolve(|c| c.identity.as_ref().and_then(|i| i.nonce_strategy.as_deref()))
            .and_then(NonceStrategy::from_name)
            .unwrap_or_default()
    }

    /// Base URL of the web front end.
    pub fn web_base_url(&self) -> &str {
        self.resolve(|c| c.web.as_ref().and_then(|w| w.base_url.as_deref()))
            .unwrap_or(DEFAULT_WEB_BASE_URL)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

impl FileConfig {
    /// Read a value by dotted key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for keys not in [`KNOWN_KEYS`].
    pub fn get_key(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "rpc_url" => self.rpc_url.clone(),
            "contract" => self.contract.clone(),
            "account" => self.account.clone(),
            "tx.poll_interval_ms" => self
                .tx
                .as_ref()
                .and_then(|t| t.poll_interval_ms)
                .map(|v| v.to_string()),
            "tx.receipt_timeout_secs" => self
                .tx
                .as_ref()
                .and_then(|t| t.receipt_timeout_secs)
                .map(|v| v.to_string()),
            "identity.nonce_strategy" => self
                .identity
                .as_ref()
                .and_then(|i| i.nonce_strategy.clone()),
            "web.base_url" => self.web.as_ref().and_then(|w| w.base_url.clone()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Set a value by dotted key, validating the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for unknown keys and
    /// `ConfigError::InvalidValue` if the new value is invalid.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let parse_u64 = |v: &str| {
            v.parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))
        };

        let mut updated = self.clone();
        match key {
            "rpc_url" => updated.rpc_url = Some(value.to_string()),
            "contract" => updated.contract = Some(value.to_string()),
            "account" => updated.account = Some(value.to_string()),
            "tx.poll_interval_ms" => {
                updated.tx.get_or_insert_with(Default::default).poll_interval_ms =
                    Some(parse_u64(value)?)
            }
            "tx.receipt_timeout_secs" => {
                updated
                    .tx
                    .get_or_insert_with(Default::default)
                    .receipt_timeout_secs = Some(parse_u64(value)?)
            }
            "identity.nonce_strategy" => {
                updated
                    .identity
                    .get_or_insert_with(Default::default)
                    .nonce_strategy = Some(value.to_string())
            }
            "web.base_url" => {
                updated.web.get_or_insert_with(Default::default).base_url = Some(value.to_string())
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
