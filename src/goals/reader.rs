//! goals::reader
//!
//! Goal id to structured snapshot.
//!
//! # Not-found
//!
//! The contract answers `getGoalDetails` for any id; unknown ids come back
//! as an all-default tuple. A zero owner is therefore reported as
//! [`ContractError::NotFound`].
//!
//! # Invariant replay
//!
//! Every snapshot is checked with [`Goal::check_invariants`]. Violations are
//! logged at `warn` and returned with the snapshot. Nothing is repaired.
//!
//! # Loading state
//!
//! [`GoalView`] holds one goal's state across refreshes. Before the first
//! successful read it reports [`GoalState::Pending`], and
//! [`GoalView::goal_or_default`] substitutes [`Goal::pending`].

use tracing::{debug, warn};

use crate::contract::{ContractError, GoalContract};
use crate::core::goal::{Goal, GoalState, InvariantViolation};
use crate::core::types::GoalId;

/// A fetched goal and its invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSnapshot {
    pub goal_id: GoalId,
    pub goal: Goal,
    pub violations: Vec<InvariantViolation>,
}

impl GoalSnapshot {
    /// Whether the snapshot satisfies every invariant.
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Reads goal snapshots from the contract.
pub struct GoalStateReader<'a> {
    contract: &'a dyn GoalContract,
}

impl<'a> GoalStateReader<'a> {
    pub fn new(contract: &'a dyn GoalContract) -> Self {
        Self { contract }
    }

    /// Read and check the goal `goal_id`.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::NotFound` if the contract reports a zero
    /// owner, or any error from the contract call.
    pub async fn read(&self, goal_id: GoalId) -> Result<GoalSnapshot, ContractError> {
        debug!(goal_id = %goal_id, "reading goal");
        let goal = self.contract.get_goal_details(goal_id).await?;

        if goal.owner.is_zero() {
            return Err(ContractError::NotFound(goal_id.to_string()));
        }

        let violations = goal.check_invariants();
        for violation in &violations {
            warn!(goal_id = %goal_id, "inconsistent goal snapshot: {}", violation);
        }

        Ok(GoalSnapshot {
            goal_id,
            goal,
            violations,
        })
    }

    /// Read a goal, mapping the result into a loaded [`GoalState`].
    pub async fn load(&self, goal_id: GoalId) -> Result<GoalState, ContractError> {
        self.read(goal_id).await.map(|s| GoalState::Ready(s.goal))
    }
}

/// One goal's state across refreshes.
pub struct GoalView<'a> {
    reader: GoalStateReader<'a>,
    goal_id: GoalId,
    state: GoalState,
    violations: Vec<InvariantViolation>,
}

impl<'a> GoalView<'a> {
    /// A view that has not loaded yet.
    pub fn new(contract: &'a dyn GoalContract, goal_id: GoalId) -> Self {
        Self {
            reader: GoalStateReader::new(contract),
            goal_id,
            state: GoalState::Pending,
            violations: Vec::new(),
        }
    }

    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }

    pub fn state(&self) -> &GoalState {
        &self.state
    }

    /// Violations found in the latest snapshot.
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// The latest snapshot, or default values while pending.
    pub fn goal_or_default(&self) -> Goal {
        self.state.clone().into_goal_or_default()
    }

    /// Re-read the goal.
    ///
    /// On failure the previous state is kept.
    pub async fn refresh(&mut self) -> Result<Goal, ContractError> {
        let snapshot = self.reader.read(self.goal_id).await?;
        self.violations = snapshot.violations;
        self.state = GoalState::Ready(snapshot.goal.clone());
        Ok(snapshot.goal)
    }
}
