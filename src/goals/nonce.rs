//! goals::nonce
//!
//! Per-owner goal counts.
//!
//! The contract's `userGoalNonce(owner)` is the number of goals `owner` has
//! created. Goals are enumerated by deriving the id for every nonce below
//! it; there is no on-chain list to page through.

use thiserror::Error;
use tracing::debug;

use super::GoalRef;
use crate::contract::{ContractError, GoalContract};
use crate::core::identity::{goal_id, goal_ids, latest_goal_id};
use crate::core::types::{Address, GoalId, Nonce};

/// Errors from resolving a goal reference.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("goal index {0} needs an owner: pass --owner or configure an account")]
    NoOwner(Nonce),

    #[error("goal index {index} is out of range: {owner} has {count} goal(s)")]
    OutOfRange {
        owner: Address,
        index: Nonce,
        count: Nonce,
    },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Reads goal counts and enumerates goal ids.
pub struct GoalNonceTracker<'a> {
    contract: &'a dyn GoalContract,
}

impl<'a> GoalNonceTracker<'a> {
    pub fn new(contract: &'a dyn GoalContract) -> Self {
        Self { contract }
    }

    /// Current nonce (goal count) of `owner`.
    pub async fn current(&self, owner: &Address) -> Result<Nonce, ContractError> {
        let nonce = self.contract.user_goal_nonce(owner).await?;
        debug!(owner = %owner, nonce = nonce.value(), "read goal nonce");
        Ok(nonce)
    }

    /// Ids of every goal `owner` has created, oldest first.
    pub async fn goal_ids(&self, owner: &Address) -> Result<Vec<(Nonce, GoalId)>, ContractError> {
        let count = self.current(owner).await?;
        Ok(goal_ids(owner, count).collect())
    }

    /// Id of the most recently created goal, if `owner` has any.
    pub async fn latest_goal_id(&self, owner: &Address) -> Result<Option<GoalId>, ContractError> {
        let count = self.current(owner).await?;
        Ok(latest_goal_id(owner, count).ok())
    }

    /// Resolve a goal reference to an id.
    ///
    /// Hashes resolve without a network call. Indexes are checked against
    /// `owner`'s current nonce.
    pub async fn resolve(&self, goal_ref: GoalRef, owner: Option<Address>) -> Result<GoalId, ResolveError> {
        match goal_ref {
            GoalRef::Hash(id) => Ok(id),
            GoalRef::Index(index) => {
                let owner = owner.ok_or(ResolveError::NoOwner(index))?;
                let count = self.current(&owner).await?;
                if index >= count {
                    return Err(ResolveError::OutOfRange {
                        owner,
                        index,
                        count,
                    });
                }
                Ok(goal_id(&owner, index))
            }
        }
    }
}
