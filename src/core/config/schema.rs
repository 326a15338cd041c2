//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$AKUNTABEL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/akuntabel/config.toml`
//! 3. `~/.akuntabel/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `.akuntabel/config.toml` in the working directory. Uses the
//! same schema; any key set there overrides the global value.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (addresses parse, URLs are http(s), intervals non-zero).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::Address;

/// Configuration file contents (either scope).
///
/// # Example
///
/// ```toml
/// rpc_url = "http://127.0.0.1:8545"
/// contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
/// account = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
///
/// [tx]
/// poll_interval_ms = 500
/// receipt_timeout_secs = 60
///
/// [identity]
/// nonce_strategy = "refetch"
///
/// [web]
/// base_url = "http://localhost:3000"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// JSON-RPC endpoint of the node
    pub rpc_url: Option<String>,

    /// Address of the deployed contract
    pub contract: Option<String>,

    /// Account used to send transactions and as the default goal owner
    pub account: Option<String>,

    /// Transaction confirmation settings
    pub tx: Option<TxConfig>,

    /// Goal id derivation settings
    pub identity: Option<IdentityConfig>,

    /// Web front end settings
    pub web: Option<WebConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.rpc_url {
            validate_http_url("rpc_url", url)?;
        }
        if let Some(contract) = &self.contract {
            Address::parse(contract)
                .map_err(|e| ConfigError::InvalidValue(format!("contract: {}", e)))?;
        }
        if let Some(account) = &self.account {
            Address::parse(account)
                .map_err(|e| ConfigError::InvalidValue(format!("account: {}", e)))?;
        }
        if let Some(tx) = &self.tx {
            tx.validate()?;
        }
        if let Some(identity) = &self.identity {
            identity.validate()?;
        }
        if let Some(web) = &self.web {
            if let Some(base) = &web.base_url {
                validate_http_url("web.base_url", base)?;
            }
        }
        Ok(())
    }
}

/// Check that `value` is an http or https URL.
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must start with http:// or https://, got '{}'",
            key, value
        )))
    }
}

/// Transaction confirmation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TxConfig {
    /// Delay between receipt polls
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting for a receipt after this long
    pub receipt_timeout_secs: Option<u64>,
}

impl TxConfig {
    /// Validate the transaction settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "tx.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.receipt_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "tx.receipt_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Goal id derivation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// How the id of a just-created goal is derived ("refetch" or "pre-capture")
    pub nonce_strategy: Option<String>,
}

impl IdentityConfig {
    /// Valid nonce strategies.
    pub const VALID_STRATEGIES: &'static [&'static str] = &["refetch", "pre-capture"];

    /// Validate the identity settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(strategy) = &self.nonce_strategy {
            if !Self::VALID_STRATEGIES.contains(&strategy.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid nonce strategy '{}', must be one of: {}",
                    strategy,
                    Self::VALID_STRATEGIES.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Web front end settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    /// Base URL that serves `/goals/<id>` pages
    pub base_url: Option<String>,
}
