//! contract
//!
//! Access to the deployed goal contract.
//!
//! # Architecture
//!
//! The `GoalContract` trait defines the interface to the contract. Commands
//! use the [`create_contract`] factory rather than importing a backend
//! directly; tests use [`mock::MockContract`].
//!
//! - Goal state lives only in the contract; nothing here caches it
//! - Write methods resolve after confirmation, never before
//! - Remote failures are returned, not retried
//!
//! # Modules
//!
//! - `traits`: Core `GoalContract` trait, receipts, and events
//! - [`abi`]: Solidity ABI encoding and decoding
//! - [`interface`]: Calldata, return data, and log layouts of the contract
//! - [`rpc`]: Ethereum JSON-RPC implementation
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Backend creation from configuration

pub mod abi;
mod factory;
pub mod interface;
pub mod mock;
pub mod rpc;
mod traits;

pub use factory::create_contract;
pub use traits::*;
