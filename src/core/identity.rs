//! core::identity
//!
//! Deterministic goal identifier derivation.
//!
//! # Derivation
//!
//! A goal id is `keccak256(owner ‖ nonce)`, where `owner` is the raw 20-byte
//! address and `nonce` is a 32-byte big-endian unsigned integer. This is the
//! same packed encoding the contract uses to key its goal storage, so a
//! client can link to a goal as soon as its creation transaction confirms.
//!
//! # Nonce timing
//!
//! The nonce is the owner's goal count *before* the creating transaction.
//! Deriving with the post-creation count produces a valid-looking id for a
//! goal that does not exist; only a failed lookup reveals the mistake.
//!
//! # Example
//!
//! ```
//! use akuntabel::core::identity::goal_id;
//! use akuntabel::core::types::{Address, Nonce};
//!
//! let owner = Address::parse("0x0000000000000000000000000000000000000001").unwrap();
//! let id = goal_id(&owner, Nonce::new(0));
//! assert_eq!(
//!     id.to_hex(),
//!     "0xb9382d35273c75a50631a3e84d3c75ec9266e2b18c35a627e16cdbf26a18ca85"
//! );
//! ```

use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::core::types::{Address, GoalId, Nonce};

/// Errors from identity derivation helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A post-creation nonce of zero means no goal was created.
    #[error("{owner} has not created any goals")]
    NoGoals { owner: Address },
}

/// How the id of a just-created goal is derived.
///
/// Which one is correct depends on when the contract increments the nonce
/// relative to the caller's reads; neither is detectable as wrong locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonceStrategy {
    /// Re-read the nonce after the transaction confirms and subtract one.
    #[default]
    Refetch,
    /// Read the nonce before submitting and use it unchanged.
    PreCapture,
}

impl NonceStrategy {
    /// Parse a strategy from its config name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "refetch" => Some(NonceStrategy::Refetch),
            "pre-capture" => Some(NonceStrategy::PreCapture),
            _ => None,
        }
    }

    /// The config name of this strategy.
    pub fn name(&self) -> &'static str {
        match self {
            NonceStrategy::Refetch => "refetch",
            NonceStrategy::PreCapture => "pre-capture",
        }
    }
}

impl std::fmt::Display for NonceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the keccak256 hash of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Derive the identifier of the goal created by `owner` at `nonce`.
pub fn goal_id(owner: &Address, nonce: Nonce) -> GoalId {
    let mut packed = [0u8; 52];
    packed[..20].copy_from_slice(owner.as_bytes());
    packed[20..].copy_from_slice(&nonce.to_be_word());
    GoalId::from_bytes(keccak256(packed))
}

/// Identifiers of every goal `owner` has created, given its current nonce.
///
/// Yields `(nonce, id)` for nonces `0..count`.
pub fn goal_ids(owner: &Address, count: Nonce) -> impl Iterator<Item = (Nonce, GoalId)> + '_ {
    (0..count.value()).map(move |n| {
        let nonce = Nonce::new(n);
        (nonce, goal_id(owner, nonce))
    })
}

/// Identifier of the most recent goal, given the nonce read *after* creation.
///
/// # Errors
///
/// Returns `IdentityError::NoGoals` if `post_creation` is zero.
pub fn latest_goal_id(owner: &Address, post_creation: Nonce) -> Result<GoalId, IdentityError> {
    let nonce = post_creation
        .prev()
        .ok_or(IdentityError::NoGoals { owner: *owner })?;
    Ok(goal_id(owner, nonce))
}
