//! core::goal
//!
//! Goal snapshot and goal-creation input.
//!
//! # Snapshot
//!
//! [`Goal`] mirrors the tuple returned by the contract's `getGoalDetails`,
//! with positional fields mapped to names. The client never mutates a
//! snapshot; it requests mutations from the contract and re-reads.
//!
//! # Invariants
//!
//! A well-formed snapshot satisfies:
//! - `verified_approvals.len() == judges.len()`
//! - `milestone_achieved.len() == milestone_descriptions.len()`
//! - `funds_released` implies `completed`
//! - `current_approvals` equals the number of `true` verified approvals
//! - `completed` equals "every milestone achieved"
//!
//! These are enforced by the contract. [`Goal::check_invariants`] replays
//! them against a fetched snapshot and reports every violation.
//!
//! # Creation input
//!
//! [`GoalDraft`] holds raw user input. [`GoalDraft::validate`] produces a
//! typed [`CreateGoalRequest`] or the full list of field errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Address, Wei};

/// Snapshot of a goal's on-chain state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Account that created the goal
    pub owner: Address,
    /// Goal description
    pub description: String,
    /// Locked stake
    pub stake: Wei,
    /// Judges, in the order given at creation
    pub judges: Vec<Address>,
    /// Approvals needed before funds are released
    pub required_approvals: u64,
    /// Approvals recorded so far
    pub current_approvals: u64,
    /// Per-judge approval flags, parallel to `judges`
    pub verified_approvals: Vec<bool>,
    /// Milestone descriptions, in order
    pub milestone_descriptions: Vec<String>,
    /// Per-milestone achievement flags, parallel to `milestone_descriptions`
    pub milestone_achieved: Vec<bool>,
    /// Every milestone achieved
    pub completed: bool,
    /// Stake paid out
    pub funds_released: bool,
}

/// A violated snapshot invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `verified_approvals` is not parallel to `judges`.
    ApprovalsLength { judges: usize, verified: usize },
    /// `milestone_achieved` is not parallel to `milestone_descriptions`.
    MilestonesLength { descriptions: usize, achieved: usize },
    /// Funds were released on a goal that is not completed.
    ReleasedBeforeCompletion,
    /// `current_approvals` disagrees with the approval flags.
    ApprovalCount { reported: u64, counted: u64 },
    /// `completed` disagrees with the milestone flags.
    Completion { reported: bool, all_achieved: bool },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::ApprovalsLength { judges, verified } => write!(
                f,
                "{} judges but {} approval flags",
                judges, verified
            ),
            InvariantViolation::MilestonesLength {
                descriptions,
                achieved,
            } => write!(
                f,
                "{} milestones but {} achievement flags",
                descriptions, achieved
            ),
            InvariantViolation::ReleasedBeforeCompletion => {
                write!(f, "funds released before the goal was completed")
            }
            InvariantViolation::ApprovalCount { reported, counted } => write!(
                f,
                "approval count is {} but {} judges approved",
                reported, counted
            ),
            InvariantViolation::Completion {
                reported,
                all_achieved,
            } => write!(
                f,
                "completed is {} but all milestones achieved is {}",
                reported, all_achieved
            ),
        }
    }
}

impl Goal {
    /// Snapshot with default values, used while the real one is loading.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Number of milestones.
    pub fn milestone_count(&self) -> usize {
        self.milestone_descriptions.len()
    }

    /// Number of achieved milestones.
    pub fn milestones_completed(&self) -> usize {
        self.milestone_achieved.iter().filter(|a| **a).count()
    }

    /// Whether `account` owns this goal.
    pub fn is_owner(&self, account: &Address) -> bool {
        self.owner == *account
    }

    /// Position of `account` in the judge list.
    pub fn judge_index(&self, account: &Address) -> Option<usize> {
        self.judges.iter().position(|j| j == account)
    }

    /// Whether `account` is a listed judge.
    pub fn is_judge(&self, account: &Address) -> bool {
        self.judge_index(account).is_some()
    }

    /// Whether `account` is a judge who already approved.
    pub fn has_approved(&self, account: &Address) -> bool {
        self.judge_index(account)
            .and_then(|i| self.verified_approvals.get(i).copied())
            .unwrap_or(false)
    }

    /// Whether milestone `index` is achieved. Out-of-range is `None`.
    pub fn milestone_is_achieved(&self, index: usize) -> Option<bool> {
        if index >= self.milestone_count() {
            return None;
        }
        Some(self.milestone_achieved.get(index).copied().unwrap_or(false))
    }

    /// Replay the snapshot invariants, returning every violation.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if self.verified_approvals.len() != self.judges.len() {
            violations.push(InvariantViolation::ApprovalsLength {
                judges: self.judges.len(),
                verified: self.verified_approvals.len(),
            });
        }

        if self.milestone_achieved.len() != self.milestone_descriptions.len() {
            violations.push(InvariantViolation::MilestonesLength {
                descriptions: self.milestone_descriptions.len(),
                achieved: self.milestone_achieved.len(),
            });
        }

        if self.funds_released && !self.completed {
            violations.push(InvariantViolation::ReleasedBeforeCompletion);
        }

        let counted = self.verified_approvals.iter().filter(|v| **v).count() as u64;
        if counted != self.current_approvals {
            violations.push(InvariantViolation::ApprovalCount {
                reported: self.current_approvals,
                counted,
            });
        }

        let all_achieved = self.milestone_achieved.iter().all(|a| *a);
        if all_achieved != self.completed {
            violations.push(InvariantViolation::Completion {
                reported: self.completed,
                all_achieved,
            });
        }

        violations
    }
}

/// A goal snapshot that may still be loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalState {
    /// Not loaded yet
    Pending,
    /// Loaded snapshot
    Ready(Goal),
}

impl GoalState {
    /// Whether the snapshot is still loading.
    pub fn is_pending(&self) -> bool {
        matches!(self, GoalState::Pending)
    }

    /// The loaded snapshot, if any.
    pub fn goal(&self) -> Option<&Goal> {
        match self {
            GoalState::Ready(goal) => Some(goal),
            GoalState::Pending => None,
        }
    }

    /// The loaded snapshot, or default values while pending.
    pub fn into_goal_or_default(self) -> Goal {
        match self {
            GoalState::Ready(goal) => goal,
            GoalState::Pending => Goal::pending(),
        }
    }
}

/// Raw goal-creation input, as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub description: String,
    pub judges: Vec<String>,
    pub milestones: Vec<String>,
    pub required_approvals: u64,
    /// Stake in ether, e.g. `"0.01"`
    pub stake: String,
}

impl Default for GoalDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            judges: vec![String::new()],
            milestones: vec![String::new()],
            required_approvals: 1,
            stake: "0.01".to_string(),
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field path, e.g. `description` or `judges[1]`
    pub field: String,
    /// Message for the user
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors from validating a [`GoalDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid goal: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Whether any error concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

/// Validated goal-creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGoalRequest {
    pub description: String,
    pub judges: Vec<Address>,
    pub milestones: Vec<String>,
    pub required_approvals: u64,
    pub stake: Wei,
}

impl GoalDraft {
    /// Validate the draft.
    ///
    /// Every field is checked; all failures are returned together.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` listing each invalid field.
    pub fn validate(&self) -> Result<CreateGoalRequest, ValidationErrors> {
        let mut errors = Vec::new();

        let description = self.description.trim();
        if description.is_empty() {
            errors.push(FieldError::new("description", "Goal description is required"));
        }

        let stake = if self.stake.trim().is_empty() {
            errors.push(FieldError::new("stake", "Stake is required"));
            None
        } else {
            match Wei::parse_ether(&self.stake) {
                Ok(w) if w.is_zero() => {
                    errors.push(FieldError::new("stake", "Stake must be greater than zero"));
                    None
                }
                Ok(w) => Some(w),
                Err(e) => {
                    errors.push(FieldError::new("stake", e.to_string()));
                    None
                }
            }
        };

        if self.judges.is_empty() {
            errors.push(FieldError::new("judges", "At least one judge is required"));
        }
        let mut judges: Vec<Address> = Vec::with_capacity(self.judges.len());
        for (i, raw) in self.judges.iter().enumerate() {
            let field = format!("judges[{}]", i);
            if raw.trim().is_empty() {
                errors.push(FieldError::new(field, "Judge address is required"));
                continue;
            }
            match Address::parse(raw) {
                Ok(addr) if judges.contains(&addr) => {
                    errors.push(FieldError::new(field, "Duplicate judge address"));
                }
                Ok(addr) => judges.push(addr),
                Err(e) => errors.push(FieldError::new(field, e.to_string())),
            }
        }

        if self.milestones.is_empty() {
            errors.push(FieldError::new(
                "milestones",
                "At least one milestone is required",
            ));
        }
        for (i, m) in self.milestones.iter().enumerate() {
            if m.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("milestones[{}]", i),
                    "Milestone description is required",
                ));
            }
        }

        let judge_count = self.judges.len() as u64;
        if self.required_approvals < 1 {
            errors.push(FieldError::new(
                "requiredApprovals",
                "Minimum required approvals is 1",
            ));
        } else if self.required_approvals > judge_count {
            errors.push(FieldError::new(
                "requiredApprovals",
                format!("Maximum required approvals is {}", judge_count),
            ));
        }

        match stake {
            Some(stake) if errors.is_empty() => Ok(CreateGoalRequest {
                description: description.to_string(),
                judges,
                milestones: self.milestones.iter().map(|m| m.trim().to_string()).collect(),
                required_approvals: self.required_approvals,
                stake,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUDGE_A: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const JUDGE_B: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn sample_goal() -> Goal {
        Goal {
            owner: addr("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            description: "Run every day".to_string(),
            stake: Wei::parse_ether("0.5").unwrap(),
            judges: vec![addr(JUDGE_A), addr(JUDGE_B)],
            required_approvals: 1,
            current_approvals: 1,
            verified_approvals: vec![false, true],
            milestone_descriptions: vec!["Week 1".to_string(), "Week 2".to_string()],
            milestone_achieved: vec![true, true],
            completed: true,
            funds_released: true,
        }
    }

    fn draft() -> GoalDraft {
        GoalDraft {
            description: "Learn Rust".to_string(),
            judges: vec![JUDGE_A.to_string(), JUDGE_B.to_string()],
            milestones: vec!["Read the book".to_string(), "Ship a crate".to_string()],
            required_approvals: 2,
            stake: "0.01".to_string(),
        }
    }

    mod snapshot {
        use super::*;

        #[test]
        fn well_formed_goal_has_no_violations() {
            assert!(sample_goal().check_invariants().is_empty());
        }

        #[test]
        fn pending_goal_reports_vacuous_completion() {
            // An empty milestone list counts as all achieved.
            let pending = Goal::pending();
            assert_eq!(
                pending.check_invariants(),
                vec![InvariantViolation::Completion {
                    reported: false,
                    all_achieved: true
                }]
            );
        }

        #[test]
        fn reports_every_violation() {
            let goal = Goal {
                verified_approvals: vec![true],
                milestone_achieved: vec![false, true],
                completed: false,
                funds_released: true,
                current_approvals: 3,
                ..sample_goal()
            };
            let violations = goal.check_invariants();
            assert!(violations.contains(&InvariantViolation::ApprovalsLength {
                judges: 2,
                verified: 1
            }));
            assert!(violations.contains(&InvariantViolation::ReleasedBeforeCompletion));
            assert!(violations.contains(&InvariantViolation::ApprovalCount {
                reported: 3,
                counted: 1
            }));
            assert!(!violations
                .iter()
                .any(|v| matches!(v, InvariantViolation::Completion { .. })));
        }

        #[test]
        fn milestone_length_mismatch() {
            let goal = Goal {
                milestone_achieved: vec![true],
                ..sample_goal()
            };
            assert!(goal
                .check_invariants()
                .contains(&InvariantViolation::MilestonesLength {
                    descriptions: 2,
                    achieved: 1
                }));
        }

        #[test]
        fn judge_queries() {
            let goal = sample_goal();
            assert_eq!(goal.judge_index(&addr(JUDGE_B)), Some(1));
            assert!(goal.is_judge(&addr(JUDGE_A)));
            assert!(!goal.has_approved(&addr(JUDGE_A)));
            assert!(goal.has_approved(&addr(JUDGE_B)));
            assert!(!goal.is_judge(&goal.owner));
            assert!(goal.is_owner(&addr("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")));
        }

        #[test]
        fn milestone_queries() {
            let goal = Goal {
                milestone_achieved: vec![true, false],
                completed: false,
                funds_released: false,
                ..sample_goal()
            };
            assert_eq!(goal.milestone_count(), 2);
            assert_eq!(goal.milestones_completed(), 1);
            assert_eq!(goal.milestone_is_achieved(0), Some(true));
            assert_eq!(goal.milestone_is_achieved(1), Some(false));
            assert_eq!(goal.milestone_is_achieved(2), None);
        }

        #[test]
        fn goal_state_defaults_while_pending() {
            assert!(GoalState::Pending.is_pending());
            assert_eq!(GoalState::Pending.into_goal_or_default(), Goal::pending());
            let ready = GoalState::Ready(sample_goal());
            assert_eq!(ready.goal().map(|g| g.description.as_str()), Some("Run every day"));
        }

        #[test]
        fn serializes_with_camel_case_fields() {
            let json = serde_json::to_value(sample_goal()).unwrap();
            assert_eq!(json["requiredApprovals"], 1);
            assert_eq!(json["fundsReleased"], true);
            assert_eq!(json["owner"], "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        }
    }

    mod draft_validation {
        use super::*;

        #[test]
        fn valid_draft() {
            let req = draft().validate().unwrap();
            assert_eq!(req.description, "Learn Rust");
            assert_eq!(req.judges, vec![addr(JUDGE_A), addr(JUDGE_B)]);
            assert_eq!(req.required_approvals, 2);
            assert_eq!(req.stake.as_u128(), 10_000_000_000_000_000);
        }

        #[test]
        fn default_draft_is_incomplete() {
            let errors = GoalDraft::default().validate().unwrap_err();
            assert!(errors.has_field("description"));
            assert!(errors.has_field("judges[0]"));
            assert!(errors.has_field("milestones[0]"));
            assert!(!errors.has_field("stake"));
        }

        #[test]
        fn duplicate_judge_case_insensitive() {
            let errors = GoalDraft {
                judges: vec![JUDGE_A.to_string(), JUDGE_A.to_lowercase()],
                required_approvals: 1,
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert_eq!(
                errors.0,
                vec![FieldError::new("judges[1]", "Duplicate judge address")]
            );
        }

        #[test]
        fn invalid_judge_address() {
            let errors = GoalDraft {
                judges: vec!["0x1234".to_string()],
                required_approvals: 1,
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert!(errors.has_field("judges[0]"));
        }

        #[test]
        fn approvals_out_of_range() {
            let too_few = GoalDraft {
                required_approvals: 0,
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert_eq!(too_few.0[0].message, "Minimum required approvals is 1");

            let too_many = GoalDraft {
                required_approvals: 3,
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert_eq!(too_many.0[0].message, "Maximum required approvals is 2");
        }

        #[test]
        fn no_judges_or_milestones() {
            let errors = GoalDraft {
                judges: vec![],
                milestones: vec![],
                required_approvals: 1,
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert!(errors.has_field("judges"));
            assert!(errors.has_field("milestones"));
            assert!(errors.has_field("requiredApprovals"));
        }

        #[test]
        fn stake_rules() {
            let missing = GoalDraft {
                stake: " ".to_string(),
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert_eq!(missing.0, vec![FieldError::new("stake", "Stake is required")]);

            let zero = GoalDraft {
                stake: "0".to_string(),
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert!(zero.has_field("stake"));

            let garbage = GoalDraft {
                stake: "lots".to_string(),
                ..draft()
            }
            .validate()
            .unwrap_err();
            assert!(garbage.has_field("stake"));
        }

        #[test]
        fn error_display_lists_fields() {
            let errors = GoalDraft {
                description: String::new(),
                stake: String::new(),
                ..draft()
            }
            .validate()
            .unwrap_err();
            let text = errors.to_string();
            assert!(text.starts_with("invalid goal: "));
            assert!(text.contains("description: Goal description is required"));
            assert!(text.contains("stake: Stake is required"));
        }
    }
}
