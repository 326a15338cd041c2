//! contract::factory
//!
//! Contract backend creation from configuration.
//!
//! Commands call [`create_contract`] instead of constructing a backend
//! directly, so the RPC endpoint, contract address, sender, and
//! confirmation settings always come from the merged configuration.

use super::rpc::RpcContract;
use super::traits::{ContractError, GoalContract};
use crate::core::config::Config;

/// Build the JSON-RPC backend described by `config`.
///
/// # Errors
///
/// Returns `ContractError::NotConfigured` if no contract address is set.
/// A missing account is not an error here; writes fail later with
/// `ContractError::NoSender`.
pub fn create_contract(config: &Config) -> Result<Box<dyn GoalContract>, ContractError> {
    let contract = config
        .contract()
        .ok_or_else(|| ContractError::NotConfigured("contract address".to_string()))?;

    let mut backend = RpcContract::new(config.rpc_url(), contract)
        .with_confirmation(config.poll_interval(), config.receipt_timeout());
    if let Some(account) = config.account() {
        backend = backend.with_sender(account);
    }

    tracing::debug!(
        rpc_url = config.rpc_url(),
        contract = %contract,
        sender = ?config.account(),
        "contract backend configured"
    );
    Ok(Box::new(backend))
}
