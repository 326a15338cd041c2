//! contract::mock
//!
//! Mock contract implementation for deterministic testing.
//!
//! # Design
//!
//! The mock contract provides a deterministic implementation of the
//! `GoalContract` trait. It keeps goals, nonces, and events in memory,
//! enforces the contract's rules (reverting where the real contract would),
//! and mines one block per transaction. Failure scenarios can be configured
//! per operation.
//!
//! Clones share state, so [`MockContract::as_account`] gives a judge's view
//! of the same contract.
//!
//! # Example
//!
//! ```
//! use akuntabel::contract::mock::MockContract;
//! use akuntabel::contract::GoalContract;
//! use akuntabel::core::goal::CreateGoalRequest;
//! use akuntabel::core::identity::goal_id;
//! use akuntabel::core::types::{Address, Nonce, Wei};
//!
//! # tokio_test::block_on(async {
//! let owner = Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
//! let judge = Address::parse("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();
//! let contract = MockContract::new().as_account(owner);
//!
//! contract.create_goal(&CreateGoalRequest {
//!     description: "Read 12 books".to_string(),
//!     judges: vec![judge],
//!     milestones: vec!["First book".to_string()],
//!     required_approvals: 1,
//!     stake: Wei::from_wei(1),
//! }).await.unwrap();
//!
//! let goal = contract.get_goal_details(goal_id(&owner, Nonce::new(0))).await.unwrap();
//! assert_eq!(goal.owner, owner);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::traits::{ContractError, GoalContract, GoalEvent, TxReceipt};
use crate::core::goal::{CreateGoalRequest, Goal};
use crate::core::identity::{goal_id, keccak256};
use crate::core::types::{Address, GoalId, Nonce, Wei};

/// Mock contract for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockContract {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockContractInner>>,
    /// Account this handle sends transactions from.
    sender: Option<Address>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockContractInner {
    /// Stored goals by id.
    goals: HashMap<GoalId, Goal>,
    /// Goal count per owner.
    nonces: HashMap<Address, u64>,
    /// Emitted events in order.
    events: Vec<GoalEvent>,
    /// Current block number.
    block: u64,
    /// Transactions mined so far.
    tx_count: u64,
    /// Report nonces one behind the stored value.
    stale_nonce_reads: bool,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    CreateGoal(ContractError),
    ApproveGoal(ContractError),
    AchieveMilestone(ContractError),
    GetGoalDetails(ContractError),
    UserGoalNonce(ContractError),
    GoalEvents(ContractError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateGoal {
        sender: Option<Address>,
        description: String,
        judges: Vec<Address>,
        value: Wei,
    },
    ApproveGoal {
        sender: Option<Address>,
        goal_id: GoalId,
    },
    AchieveMilestone {
        sender: Option<Address>,
        goal_id: GoalId,
        index: u64,
    },
    GetGoalDetails {
        goal_id: GoalId,
    },
    UserGoalNonce {
        owner: Address,
    },
    GoalEvents {
        from_block: u64,
        to_block: u64,
    },
}

impl MockContract {
    /// Create a new empty mock contract with no sender.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockContractInner::default())),
            sender: None,
        }
    }

    /// A handle on the same contract that sends from `account`.
    pub fn as_account(&self, account: Address) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sender: Some(account),
        }
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use akuntabel::contract::mock::{FailOn, MockContract};
    /// use akuntabel::contract::ContractError;
    ///
    /// let contract = MockContract::new()
    ///     .fail_on(FailOn::CreateGoal(ContractError::NetworkError("down".into())));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// Report every nonce one behind its stored value, as a lagging node would.
    pub fn stale_nonce_reads(self) -> Self {
        self.state().stale_nonce_reads = true;
        self
    }

    /// Store a goal snapshot directly, bypassing the contract rules.
    pub fn insert_goal(&self, goal_id: GoalId, goal: Goal) {
        self.state().goals.insert(goal_id, goal);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Get a goal by id (for test verification).
    pub fn goal_sync(&self, goal_id: &GoalId) -> Option<Goal> {
        self.state().goals.get(goal_id).cloned()
    }

    /// Get the count of goals.
    pub fn goal_count(&self) -> usize {
        self.state().goals.len()
    }

    fn state(&self) -> MutexGuard<'_, MockContractInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Result<(), ContractError> {
        let inner = self.state();
        let err = match &inner.fail_on {
            Some(FailOn::CreateGoal(e)) if expected == "create_goal" => e,
            Some(FailOn::ApproveGoal(e)) if expected == "approve_goal" => e,
            Some(FailOn::AchieveMilestone(e)) if expected == "achieve_milestone" => e,
            Some(FailOn::GetGoalDetails(e)) if expected == "get_goal_details" => e,
            Some(FailOn::UserGoalNonce(e)) if expected == "user_goal_nonce" => e,
            Some(FailOn::GoalEvents(e)) if expected == "goal_events" => e,
            _ => return Ok(()),
        };
        Err(err.clone())
    }

    fn require_sender(&self) -> Result<Address, ContractError> {
        self.sender.ok_or(ContractError::NoSender)
    }
}

impl Default for MockContract {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContractInner {
    /// Mine a block for a transaction and return its receipt.
    fn mine(&mut self) -> TxReceipt {
        self.tx_count += 1;
        self.block += 1;
        let hash = keccak256(self.tx_count.to_be_bytes());
        TxReceipt {
            tx_hash: format!("0x{}", hex::encode(hash)),
            block_number: self.block,
        }
    }

    fn goal_mut(&mut self, goal_id: &GoalId) -> Result<&mut Goal, ContractError> {
        self.goals
            .get_mut(goal_id)
            .ok_or_else(|| ContractError::Reverted("Goal does not exist".into()))
    }
}

fn revert<T>(reason: &str) -> Result<T, ContractError> {
    Err(ContractError::Reverted(reason.to_string()))
}

#[async_trait]
impl GoalContract for MockContract {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn sender(&self) -> Option<Address> {
        self.sender
    }

    async fn create_goal(&self, request: &CreateGoalRequest) -> Result<TxReceipt, ContractError> {
        self.record(MockOperation::CreateGoal {
            sender: self.sender,
            description: request.description.clone(),
            judges: request.judges.clone(),
            value: request.stake,
        });
        self.check_fail("create_goal")?;
        let owner = self.require_sender()?;

        if request.judges.is_empty() {
            return revert("At least one judge is required");
        }
        if request.required_approvals == 0
            || request.required_approvals > request.judges.len() as u64
        {
            return revert("Invalid number of required approvals");
        }
        if request.stake.is_zero() {
            return revert("Stake must be greater than zero");
        }

        let mut inner = self.state();
        let nonce = inner.nonces.get(&owner).copied().unwrap_or(0);
        let id = goal_id(&owner, Nonce::new(nonce));
        let goal = Goal {
            owner,
            description: request.description.clone(),
            stake: request.stake,
            judges: request.judges.clone(),
            required_approvals: request.required_approvals,
            current_approvals: 0,
            verified_approvals: vec![false; request.judges.len()],
            milestone_descriptions: request.milestones.clone(),
            milestone_achieved: vec![false; request.milestones.len()],
            completed: request.milestones.is_empty(),
            funds_released: false,
        };
        inner.goals.insert(id, goal);
        inner.nonces.insert(owner, nonce + 1);
        Ok(inner.mine())
    }

    async fn approve_goal(&self, goal_id: GoalId) -> Result<TxReceipt, ContractError> {
        self.record(MockOperation::ApproveGoal {
            sender: self.sender,
            goal_id,
        });
        self.check_fail("approve_goal")?;
        let judge = self.require_sender()?;

        let mut inner = self.state();
        let goal = inner.goal_mut(&goal_id)?;
        let Some(index) = goal.judge_index(&judge) else {
            return revert("Only judges can approve");
        };
        if goal.verified_approvals[index] {
            return revert("Judge has already approved");
        }
        if !goal.completed {
            return revert("Goal is not completed");
        }

        goal.verified_approvals[index] = true;
        goal.current_approvals += 1;
        if goal.current_approvals >= goal.required_approvals {
            goal.funds_released = true;
        }

        let receipt = inner.mine();
        inner.events.push(GoalEvent::GoalApproved {
            goal_id,
            judge,
            block_number: receipt.block_number,
        });
        Ok(receipt)
    }

    async fn achieve_milestone(&self, goal_id: GoalId, index: u64) -> Result<TxReceipt, ContractError> {
        self.record(MockOperation::AchieveMilestone {
            sender: self.sender,
            goal_id,
            index,
        });
        self.check_fail("achieve_milestone")?;
        let sender = self.require_sender()?;

        let mut inner = self.state();
        let goal = inner.goal_mut(&goal_id)?;
        if !goal.is_owner(&sender) {
            return revert("Only the goal owner can achieve milestones");
        }
        let slot = usize::try_from(index)
            .ok()
            .filter(|i| *i < goal.milestone_achieved.len());
        let Some(slot) = slot else {
            return revert("Invalid milestone index");
        };
        if goal.milestone_achieved[slot] {
            return revert("Milestone already achieved");
        }

        goal.milestone_achieved[slot] = true;
        goal.completed = goal.milestone_achieved.iter().all(|a| *a);

        let receipt = inner.mine();
        inner.events.push(GoalEvent::MilestoneAchieved {
            goal_id,
            milestone_index: index,
            block_number: receipt.block_number,
        });
        Ok(receipt)
    }

    async fn get_goal_details(&self, goal_id: GoalId) -> Result<Goal, ContractError> {
        self.record(MockOperation::GetGoalDetails { goal_id });
        self.check_fail("get_goal_details")?;

        Ok(self.state().goals.get(&goal_id).cloned().unwrap_or_default())
    }

    async fn user_goal_nonce(&self, owner: &Address) -> Result<Nonce, ContractError> {
        self.record(MockOperation::UserGoalNonce { owner: *owner });
        self.check_fail("user_goal_nonce")?;

        let inner = self.state();
        let stored = inner.nonces.get(owner).copied().unwrap_or(0);
        let reported = if inner.stale_nonce_reads {
            stored.saturating_sub(1)
        } else {
            stored
        };
        Ok(Nonce::new(reported))
    }

    async fn block_number(&self) -> Result<u64, ContractError> {
        Ok(self.state().block)
    }

    async fn goal_events(&self, from_block: u64, to_block: u64) -> Result<Vec<GoalEvent>, ContractError> {
        self.record(MockOperation::GoalEvents {
            from_block,
            to_block,
        });
        self.check_fail("goal_events")?;

        Ok(self
            .state()
            .events
            .iter()
            .filter(|e| (from_block..=to_block).contains(&e.block_number()))
            .cloned()
            .collect())
    }
}
