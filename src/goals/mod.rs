//! goals
//!
//! Goal reads, nonce tracking, transactions, and event watching on top of
//! a [`GoalContract`](crate::contract::GoalContract).
//!
//! # Modules
//!
//! - [`reader`]: GoalId to goal snapshot, with not-found and invariant checks
//! - [`nonce`]: Per-owner goal counts and goal enumeration
//! - [`actions`]: Create, approve, and milestone transactions with local gating
//! - [`watch`]: Event polling that re-reads a goal when it changes
//!
//! Goals are addressed by [`GoalRef`]: either the goal hash, or the
//! position of the goal among its owner's goals.

pub mod actions;
pub mod nonce;
pub mod reader;
pub mod watch;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::types::{GoalId, Nonce};

/// Errors from parsing a goal reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GoalRefError {
    #[error("invalid goal hash '{0}': expected 0x followed by 64 hex digits")]
    InvalidHash(String),

    #[error("goal index cannot be negative: {0}")]
    NegativeIndex(String),

    #[error("invalid goal reference '{0}': expected a goal hash or an index")]
    Invalid(String),
}

/// A reference to a goal as a user types it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalRef {
    /// The goal hash itself.
    Hash(GoalId),
    /// The owner's Nth goal (the nonce it was created with).
    Index(Nonce),
}

impl GoalRef {
    /// Parse a goal hash (`0x` + 64 hex digits) or a decimal index.
    ///
    /// # Example
    ///
    /// ```
    /// use akuntabel::goals::GoalRef;
    /// use akuntabel::core::types::Nonce;
    ///
    /// assert_eq!(GoalRef::parse("3").unwrap(), GoalRef::Index(Nonce::new(3)));
    /// assert!(GoalRef::parse("-1").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, GoalRefError> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            return GoalId::parse(s)
                .map(GoalRef::Hash)
                .map_err(|_| GoalRefError::InvalidHash(s.to_string()));
        }
        if s.starts_with('-') {
            return Err(GoalRefError::NegativeIndex(s.to_string()));
        }
        Nonce::parse(s)
            .map(GoalRef::Index)
            .map_err(|_| GoalRefError::Invalid(s.to_string()))
    }
}

impl fmt::Display for GoalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalRef::Hash(id) => write!(f, "{}", id),
            GoalRef::Index(n) => write!(f, "#{}", n),
        }
    }
}

impl FromStr for GoalRef {
    type Err = GoalRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
