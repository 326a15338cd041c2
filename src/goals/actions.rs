//! goals::actions
//!
//! Goal transactions with local gating.
//!
//! Each action validates or gates locally, submits one transaction, waits
//! for confirmation, and then performs its dependent read. Gating mirrors
//! what the contract enforces so obvious mistakes never cost gas; the
//! contract stays the authority.
//!
//! | Action            | Gate                                                   |
//! |-------------------|--------------------------------------------------------|
//! | create            | draft validates                                        |
//! | approve           | caller is a judge, has not approved, goal is completed |
//! | achieve milestone | index in range, milestone not achieved                 |
//!
//! A milestone caller who is not the owner is warned, not blocked.
//!
//! # Created goal id
//!
//! The id of a new goal depends on the owner's nonce at creation time. The
//! configured [`NonceStrategy`] picks when the nonce is read. Either way,
//! the derived id is verified by reading the goal back; a mismatch is a
//! warning on the outcome.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use super::reader::GoalStateReader;
use crate::contract::{ContractError, GoalContract, TxReceipt};
use crate::core::goal::{CreateGoalRequest, Goal, GoalDraft, ValidationErrors};
use crate::core::identity::{goal_id, latest_goal_id, IdentityError, NonceStrategy};
use crate::core::types::{Address, GoalId};

/// Errors from goal actions.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("no account configured to send transactions")]
    NoSender,

    #[error("{account} is not a judge of this goal")]
    NotJudge { account: Address },

    #[error("{account} has already approved this goal")]
    AlreadyApproved { account: Address },

    #[error("approval is not active until every milestone is achieved ({achieved}/{total} done)")]
    NotCompleted { achieved: usize, total: usize },

    #[error("milestone {number} does not exist: the goal has {count} milestone(s)")]
    MilestoneOutOfRange { number: u64, count: usize },

    #[error("milestone {number} is already achieved")]
    MilestoneAlreadyAchieved { number: u64 },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Result of checking a created goal against the derived id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The goal exists, is owned by the sender, and matches the request.
    Confirmed,
    /// Nothing exists at the derived id.
    Missing,
    /// The goal at the derived id belongs to someone else.
    OwnerMismatch { expected: Address, found: Address },
    /// The goal at the derived id has a different description.
    DescriptionMismatch { found: String },
    /// A read needed for verification failed.
    Unverified(String),
}

impl Verification {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Verification::Confirmed)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Confirmed => write!(f, "confirmed"),
            Verification::Missing => write!(f, "no goal exists at the derived id"),
            Verification::OwnerMismatch { expected, found } => write!(
                f,
                "goal at the derived id is owned by {}, expected {}",
                found, expected
            ),
            Verification::DescriptionMismatch { found } => write!(
                f,
                "goal at the derived id has a different description: '{}'",
                found
            ),
            Verification::Unverified(reason) => write!(f, "could not verify the goal: {}", reason),
        }
    }
}

/// Outcome of creating a goal.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub receipt: TxReceipt,
    /// Derived id of the new goal. `None` when the post-creation nonce
    /// could not be read; the goal still exists on chain.
    pub goal_id: Option<GoalId>,
    pub strategy: NonceStrategy,
    pub verification: Verification,
}

/// Outcome of approving a goal or achieving a milestone.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub receipt: TxReceipt,
    /// Goal state after confirmation, if the re-read succeeded.
    pub goal: Option<Goal>,
    /// Non-fatal issues noticed along the way.
    pub warnings: Vec<String>,
}

/// Submits goal transactions.
pub struct GoalActions<'a> {
    contract: &'a dyn GoalContract,
    strategy: NonceStrategy,
}

impl<'a> GoalActions<'a> {
    pub fn new(contract: &'a dyn GoalContract, strategy: NonceStrategy) -> Self {
        Self { contract, strategy }
    }

    fn sender(&self) -> Result<Address, ActionError> {
        self.contract.sender().ok_or(ActionError::NoSender)
    }

    /// Validate `draft` and create the goal.
    ///
    /// Validation errors are returned together, before any network call.
    pub async fn create(&self, draft: &GoalDraft) -> Result<CreateOutcome, ActionError> {
        let request = draft.validate()?;
        self.create_validated(&request).await
    }

    /// Create a goal from an already validated request.
    pub async fn create_validated(&self, request: &CreateGoalRequest) -> Result<CreateOutcome, ActionError> {
        let owner = self.sender()?;

        let pre_captured = match self.strategy {
            NonceStrategy::PreCapture => Some(self.contract.user_goal_nonce(&owner).await?),
            NonceStrategy::Refetch => None,
        };

        let receipt = self.contract.create_goal(request).await?;
        info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "goal created");

        let goal_id = match pre_captured {
            Some(nonce) => goal_id(&owner, nonce),
            None => match self.contract.user_goal_nonce(&owner).await {
                Ok(post) => latest_goal_id(&owner, post)?,
                Err(e) => {
                    warn!(tx_hash = %receipt.tx_hash, "goal nonce read after creation failed: {}", e);
                    return Ok(CreateOutcome {
                        receipt,
                        goal_id: None,
                        strategy: self.strategy,
                        verification: Verification::Unverified(format!("could not read the goal nonce: {}", e)),
                    });
                }
            },
        };

        let verification = self.verify_created(goal_id, &owner, request).await;
        if !verification.is_confirmed() {
            warn!(
                goal_id = %goal_id,
                strategy = %self.strategy,
                "derived goal id did not verify: {}",
                verification
            );
        }

        Ok(CreateOutcome {
            receipt,
            goal_id: Some(goal_id),
            strategy: self.strategy,
            verification,
        })
    }

    async fn verify_created(&self, goal_id: GoalId, owner: &Address, request: &CreateGoalRequest) -> Verification {
        match GoalStateReader::new(self.contract).read(goal_id).await {
            Ok(snapshot) if snapshot.goal.owner != *owner => Verification::OwnerMismatch {
                expected: *owner,
                found: snapshot.goal.owner,
            },
            Ok(snapshot) if snapshot.goal.description != request.description => {
                Verification::DescriptionMismatch {
                    found: snapshot.goal.description,
                }
            }
            Ok(_) => Verification::Confirmed,
            Err(ContractError::NotFound(_)) => Verification::Missing,
            Err(e) => Verification::Unverified(e.to_string()),
        }
    }

    /// Approve `goal_id` as the sending judge.
    pub async fn approve(&self, goal_id: GoalId) -> Result<ActionOutcome, ActionError> {
        let judge = self.sender()?;
        let goal = GoalStateReader::new(self.contract).read(goal_id).await?.goal;
        check_approval(&goal, &judge)?;

        let receipt = self.contract.approve_goal(goal_id).await?;
        info!(tx_hash = %receipt.tx_hash, goal_id = %goal_id, "goal approved");

        Ok(self.finish(goal_id, receipt, Vec::new()).await)
    }

    /// Mark milestone `index` (zero-based) of `goal_id` as achieved.
    pub async fn achieve_milestone(&self, goal_id: GoalId, index: u64) -> Result<ActionOutcome, ActionError> {
        let caller = self.sender()?;
        let goal = GoalStateReader::new(self.contract).read(goal_id).await?.goal;
        check_milestone(&goal, index)?;

        let mut warnings = Vec::new();
        if !goal.is_owner(&caller) {
            let message = format!(
                "{} is not the owner of this goal; the contract may reject the transaction",
                caller
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let receipt = self.contract.achieve_milestone(goal_id, index).await?;
        info!(tx_hash = %receipt.tx_hash, goal_id = %goal_id, index, "milestone achieved");

        Ok(self.finish(goal_id, receipt, warnings).await)
    }

    /// Re-read after a confirmed write. A failed read is a warning.
    async fn finish(&self, goal_id: GoalId, receipt: TxReceipt, mut warnings: Vec<String>) -> ActionOutcome {
        let goal = match GoalStateReader::new(self.contract).read(goal_id).await {
            Ok(snapshot) => Some(snapshot.goal),
            Err(e) => {
                warn!(goal_id = %goal_id, "re-read after transaction failed: {}", e);
                warnings.push(format!("could not refresh the goal: {}", e));
                None
            }
        };
        ActionOutcome {
            receipt,
            goal,
            warnings,
        }
    }
}

/// Check whether `judge` may approve `goal` now.
pub fn check_approval(goal: &Goal, judge: &Address) -> Result<(), ActionError> {
    if !goal.is_judge(judge) {
        return Err(ActionError::NotJudge { account: *judge });
    }
    if goal.has_approved(judge) {
        return Err(ActionError::AlreadyApproved { account: *judge });
    }
    if !goal.completed {
        return Err(ActionError::NotCompleted {
            achieved: goal.milestones_completed(),
            total: goal.milestone_count(),
        });
    }
    Ok(())
}

/// Check whether milestone `index` (zero-based) can be achieved.
pub fn check_milestone(goal: &Goal, index: u64) -> Result<(), ActionError> {
    let number = index.saturating_add(1);
    let achieved = usize::try_from(index)
        .ok()
        .and_then(|i| goal.milestone_is_achieved(i));
    match achieved {
        None => Err(ActionError::MilestoneOutOfRange {
            number,
            count: goal.milestone_count(),
        }),
        Some(true) => Err(ActionError::MilestoneAlreadyAchieved { number }),
        Some(false) => Ok(()),
    }
}
