//! contract::traits
//!
//! GoalContract trait definition for interacting with the goal contract.
//!
//! # Design
//!
//! The `GoalContract` trait is async because every operation involves
//! network I/O. All methods return `Result` so callers can surface remote
//! failures once without aborting.
//!
//! Write methods (`create_goal`, `approve_goal`, `achieve_milestone`) resolve
//! only after the transaction is confirmed. Callers perform their dependent
//! reads after the returned future completes.
//!
//! # Example
//!
//! ```ignore
//! use akuntabel::contract::{GoalContract, ContractError};
//! use akuntabel::core::identity::latest_goal_id;
//!
//! async fn create(contract: &dyn GoalContract, request: &CreateGoalRequest)
//!     -> Result<GoalId, ContractError>
//! {
//!     let sender = contract.sender().ok_or(ContractError::NoSender)?;
//!     contract.create_goal(request).await?;
//!     let nonce = contract.user_goal_nonce(&sender).await?;
//!     Ok(latest_goal_id(&sender, nonce).unwrap())
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::abi::AbiError;
use crate::core::goal::{CreateGoalRequest, Goal};
use crate::core::types::{Address, GoalId, Nonce};

/// Errors from contract operations.
///
/// These map the failure modes of a JSON-RPC node and the contract itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    /// A required setting (contract address, RPC URL) is missing.
    #[error("{0} is not configured")]
    NotConfigured(String),

    /// No account is configured to send transactions.
    #[error("no sender account configured")]
    NoSender,

    /// The requested goal does not exist.
    #[error("goal not found: {0}")]
    NotFound(String),

    /// The contract rejected the call.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// The transaction was mined but failed.
    #[error("transaction {tx_hash} reverted")]
    TransactionFailed {
        /// Hash of the failed transaction
        tx_hash: String,
    },

    /// No receipt arrived within the configured timeout.
    #[error("timed out after {waited_secs}s waiting for transaction {tx_hash}")]
    Timeout {
        /// Hash of the pending transaction
        tx_hash: String,
        /// Seconds waited
        waited_secs: u64,
    },

    /// The node returned a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message from the node
        message: String,
    },

    /// The HTTP transport returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Return data could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<AbiError> for ContractError {
    fn from(err: AbiError) -> Self {
        ContractError::Decode(err.to_string())
    }
}

/// A confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// Transaction hash (`0x`-prefixed)
    pub tx_hash: String,
    /// Block the transaction was included in
    pub block_number: u64,
}

/// An event emitted by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GoalEvent {
    /// `MilestoneAchieved(bytes32 goalId, uint256 milestoneIndex)`
    #[serde(rename_all = "camelCase")]
    MilestoneAchieved {
        goal_id: GoalId,
        milestone_index: u64,
        block_number: u64,
    },
    /// `GoalApproved(bytes32 goalId, address judge)`
    #[serde(rename_all = "camelCase")]
    GoalApproved {
        goal_id: GoalId,
        judge: Address,
        block_number: u64,
    },
}

impl GoalEvent {
    /// The goal this event refers to.
    pub fn goal_id(&self) -> GoalId {
        match self {
            GoalEvent::MilestoneAchieved { goal_id, .. } | GoalEvent::GoalApproved { goal_id, .. } => {
                *goal_id
            }
        }
    }

    /// The block this event was emitted in.
    pub fn block_number(&self) -> u64 {
        match self {
            GoalEvent::MilestoneAchieved { block_number, .. }
            | GoalEvent::GoalApproved { block_number, .. } => *block_number,
        }
    }
}

impl std::fmt::Display for GoalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalEvent::MilestoneAchieved {
                milestone_index,
                block_number,
                ..
            } => write!(
                f,
                "milestone {} achieved (block {})",
                milestone_index + 1,
                block_number
            ),
            GoalEvent::GoalApproved {
                judge, block_number, ..
            } => write!(f, "approved by {} (block {})", judge, block_number),
        }
    }
}

/// The GoalContract trait for interacting with the deployed goal contract.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ContractError>`. Callers should handle:
/// - `NoSender`: Configure an account
/// - `Reverted` / `TransactionFailed`: Display the reason to the user
/// - `Timeout`: The transaction may still confirm later
/// - `NetworkError` / `ApiError`: Check the node is reachable
#[async_trait]
pub trait GoalContract: Send + Sync {
    /// Backend name (e.g., "rpc", "mock").
    fn name(&self) -> &'static str;

    /// The account transactions are sent from, if any.
    fn sender(&self) -> Option<Address>;

    /// Create a goal, staking `request.stake` as the transaction value.
    ///
    /// # Errors
    ///
    /// - `NoSender` if no account is configured
    /// - `Reverted` if the contract rejects the arguments
    async fn create_goal(&self, request: &CreateGoalRequest) -> Result<TxReceipt, ContractError>;

    /// Approve a completed goal as one of its judges.
    async fn approve_goal(&self, goal_id: GoalId) -> Result<TxReceipt, ContractError>;

    /// Mark the milestone at `index` (zero-based) as achieved.
    async fn achieve_milestone(&self, goal_id: GoalId, index: u64) -> Result<TxReceipt, ContractError>;

    /// Read the raw goal tuple.
    ///
    /// Unknown goals come back with a zero owner rather than an error;
    /// see [`crate::goals::reader`] for the not-found mapping.
    async fn get_goal_details(&self, goal_id: GoalId) -> Result<Goal, ContractError>;

    /// Number of goals `owner` has created.
    async fn user_goal_nonce(&self, owner: &Address) -> Result<Nonce, ContractError>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64, ContractError>;

    /// Goal events emitted in `from_block..=to_block`, in log order.
    async fn goal_events(&self, from_block: u64, to_block: u64) -> Result<Vec<GoalEvent>, ContractError>;
}
