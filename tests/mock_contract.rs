//! Goal lifecycle tests against MockContract.
//!
//! These run the goal actions end to end: create, resolve the derived id,
//! read it back, mark milestones, and approve.

use akuntabel::contract::mock::{FailOn, MockContract, MockOperation};
use akuntabel::contract::{ContractError, GoalContract};
use akuntabel::core::goal::{Goal, GoalDraft};
use akuntabel::core::identity::{goal_id, IdentityError, NonceStrategy};
use akuntabel::core::types::{Address, Nonce, Wei};
use akuntabel::goals::actions::{ActionError, GoalActions, Verification};
use akuntabel::goals::nonce::GoalNonceTracker;
use akuntabel::goals::reader::GoalStateReader;
use akuntabel::goals::GoalRef;

fn address(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn owner() -> Address {
    address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
}

fn judge_a() -> Address {
    address("0x70997970c51812dc3a010c7d01b50e0d17dc79c8")
}

fn judge_b() -> Address {
    address("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc")
}

fn draft(description: &str) -> GoalDraft {
    GoalDraft {
        description: description.to_string(),
        judges: vec![judge_a().to_string(), judge_b().to_string()],
        milestones: vec!["Chapter 1".into(), "Chapter 2".into()],
        required_approvals: 2,
        stake: "0.5".into(),
    }
}

// =============================================================================
// Creation and identity
// =============================================================================

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn derived_id_resolves_to_goal_owned_by_creator() {
        for strategy in [NonceStrategy::Refetch, NonceStrategy::PreCapture] {
            let contract = MockContract::new().as_account(owner());
            let actions = GoalActions::new(&contract, strategy);

            let outcome = actions.create(&draft("Write a book")).await.unwrap();
            assert_eq!(outcome.goal_id, Some(goal_id(&owner(), Nonce::new(0))));
            assert_eq!(outcome.verification, Verification::Confirmed);
            assert_eq!(outcome.strategy, strategy);

            let snapshot = GoalStateReader::new(&contract)
                .read(outcome.goal_id.unwrap())
                .await
                .unwrap();
            assert_eq!(snapshot.goal.owner, owner());
            assert_eq!(snapshot.goal.description, "Write a book");
            assert_eq!(snapshot.goal.stake, Wei::parse_ether("0.5").unwrap());
            assert!(snapshot.is_consistent());
        }
    }

    #[tokio::test]
    async fn consecutive_goals_get_consecutive_ids() {
        let contract = MockContract::new().as_account(owner());
        let actions = GoalActions::new(&contract, NonceStrategy::Refetch);

        let first = actions.create(&draft("First")).await.unwrap();
        let second = actions.create(&draft("Second")).await.unwrap();
        assert_ne!(first.goal_id, second.goal_id);
        assert_eq!(second.goal_id, Some(goal_id(&owner(), Nonce::new(1))));

        let tracker = GoalNonceTracker::new(&contract);
        assert_eq!(tracker.current(&owner()).await.unwrap(), Nonce::new(2));
        assert_eq!(
            tracker.resolve(GoalRef::Index(Nonce::new(1)), Some(owner())).await.unwrap(),
            second.goal_id.unwrap()
        );
    }

    #[tokio::test]
    async fn lagging_nonce_is_reported_as_a_mismatch() {
        let contract = MockContract::new().as_account(owner());
        let actions = GoalActions::new(&contract, NonceStrategy::Refetch);
        actions.create(&draft("First")).await.unwrap();

        let lagging = contract.clone().stale_nonce_reads();
        let outcome = GoalActions::new(&lagging, NonceStrategy::Refetch)
            .create(&draft("Second"))
            .await
            .unwrap();

        // The id points at the first goal, which has another description.
        assert_eq!(outcome.goal_id, Some(goal_id(&owner(), Nonce::new(0))));
        assert_eq!(
            outcome.verification,
            Verification::DescriptionMismatch {
                found: "First".into()
            }
        );
    }

    #[tokio::test]
    async fn lagging_nonce_after_first_goal_is_an_identity_error() {
        let contract = MockContract::new().as_account(owner()).stale_nonce_reads();
        let err = GoalActions::new(&contract, NonceStrategy::Refetch)
            .create(&draft("Only"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::Identity(IdentityError::NoGoals { .. })
        ));
        // The transaction itself went through.
        assert_eq!(contract.goal_count(), 1);
    }

    #[tokio::test]
    async fn failed_nonce_read_after_creation_keeps_the_receipt() {
        let contract = MockContract::new().as_account(owner());
        let flaky = contract
            .clone()
            .fail_on(FailOn::UserGoalNonce(ContractError::NetworkError("blip".into())));
        let outcome = GoalActions::new(&flaky, NonceStrategy::Refetch)
            .create(&draft("Paid once"))
            .await
            .unwrap();

        assert_eq!(outcome.goal_id, None);
        assert!(matches!(outcome.verification, Verification::Unverified(_)));
        assert!(outcome.receipt.block_number > 0);
        assert_eq!(contract.goal_count(), 1);

        contract.clear_fail_on();
        let tracker = GoalNonceTracker::new(&contract);
        assert_eq!(tracker.current(&owner()).await.unwrap(), Nonce::new(1));
    }

    #[tokio::test]
    async fn invalid_draft_sends_nothing() {
        let contract = MockContract::new().as_account(owner());
        let mut bad = draft("");
        bad.judges = vec![judge_a().to_string(), judge_a().to_string()];
        bad.stake = "0".into();

        let err = GoalActions::new(&contract, NonceStrategy::Refetch)
            .create(&bad)
            .await
            .unwrap_err();
        let ActionError::Validation(errors) = err else {
            panic!("expected validation errors, got {:?}", err);
        };
        assert!(errors.has_field("description"));
        assert!(errors.has_field("stake"));
        assert!(errors.0.len() >= 3);
        assert!(contract.operations().is_empty());
    }

    #[tokio::test]
    async fn create_without_account_fails() {
        let contract = MockContract::new();
        let err = GoalActions::new(&contract, NonceStrategy::Refetch)
            .create(&draft("Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NoSender));
    }

    #[tokio::test]
    async fn rejected_transaction_is_surfaced_once() {
        let contract = MockContract::new()
            .as_account(owner())
            .fail_on(FailOn::CreateGoal(ContractError::Reverted("rejected".into())));
        let err = GoalActions::new(&contract, NonceStrategy::Refetch)
            .create(&draft("Denied"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Contract(ContractError::Reverted(_))));

        let creates = contract
            .operations()
            .into_iter()
            .filter(|op| matches!(op, MockOperation::CreateGoal { .. }))
            .count();
        assert_eq!(creates, 1);
    }
}

// =============================================================================
// Milestones and approvals
// =============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn full_lifecycle_releases_funds() {
        let contract = MockContract::new();
        let as_owner = contract.as_account(owner());
        let created = GoalActions::new(&as_owner, NonceStrategy::Refetch)
            .create(&draft("Ship it"))
            .await
            .unwrap();
        let id = created.goal_id.unwrap();

        let owner_actions = GoalActions::new(&as_owner, NonceStrategy::Refetch);
        let first = owner_actions.achieve_milestone(id, 0).await.unwrap();
        assert_eq!(first.goal.as_ref().unwrap().milestones_completed(), 1);
        assert!(!first.goal.as_ref().unwrap().completed);

        let second = owner_actions.achieve_milestone(id, 1).await.unwrap();
        assert!(second.goal.as_ref().unwrap().completed);

        let as_a = contract.as_account(judge_a());
        let after_a = GoalActions::new(&as_a, NonceStrategy::Refetch)
            .approve(id)
            .await
            .unwrap();
        let goal = after_a.goal.unwrap();
        assert_eq!(goal.current_approvals, 1);
        assert!(!goal.funds_released);

        let as_b = contract.as_account(judge_b());
        let after_b = GoalActions::new(&as_b, NonceStrategy::Refetch)
            .approve(id)
            .await
            .unwrap();
        let goal = after_b.goal.unwrap();
        assert_eq!(goal.current_approvals, 2);
        assert_eq!(goal.verified_approvals, vec![true, true]);
        assert!(goal.funds_released);
        assert!(goal.check_invariants().is_empty());
    }

    #[tokio::test]
    async fn approval_is_gated_locally() {
        let contract = MockContract::new();
        let as_owner = contract.as_account(owner());
        let id = GoalActions::new(&as_owner, NonceStrategy::Refetch)
            .create(&draft("Gate"))
            .await
            .unwrap()
            .goal_id
            .unwrap();
        contract.clear_operations();

        let as_a = contract.as_account(judge_a());
        let err = GoalActions::new(&as_a, NonceStrategy::Refetch)
            .approve(id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::NotCompleted {
                achieved: 0,
                total: 2
            }
        ));

        let err = GoalActions::new(&as_owner, NonceStrategy::Refetch)
            .approve(id)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotJudge { .. }));

        // Only reads reached the contract.
        assert!(contract
            .operations()
            .iter()
            .all(|op| matches!(op, MockOperation::GetGoalDetails { .. })));
    }

    #[tokio::test]
    async fn milestone_errors_use_one_based_numbers() {
        let contract = MockContract::new().as_account(owner());
        let actions = GoalActions::new(&contract, NonceStrategy::Refetch);
        let id = actions.create(&draft("Numbers")).await.unwrap().goal_id.unwrap();

        let err = actions.achieve_milestone(id, 5).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "milestone 6 does not exist: the goal has 2 milestone(s)"
        );

        actions.achieve_milestone(id, 0).await.unwrap();
        let err = actions.achieve_milestone(id, 0).await.unwrap_err();
        assert_eq!(err.to_string(), "milestone 1 is already achieved");
    }

    #[tokio::test]
    async fn failed_gate_read_sends_nothing() {
        let contract = MockContract::new().as_account(owner());
        let actions = GoalActions::new(&contract, NonceStrategy::Refetch);
        let id = actions.create(&draft("Flaky")).await.unwrap().goal_id.unwrap();
        contract.clear_operations();

        let flaky = contract
            .clone()
            .fail_on(FailOn::GetGoalDetails(ContractError::NetworkError("gone".into())));
        let err = GoalActions::new(&flaky, NonceStrategy::Refetch)
            .achieve_milestone(id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Contract(ContractError::NetworkError(_))));
        assert!(!contract
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::AchieveMilestone { .. })));
    }
}

// =============================================================================
// Snapshot checks
// =============================================================================

mod snapshot_tests {
    use super::*;

    #[tokio::test]
    async fn inconsistent_snapshot_is_reported_not_repaired() {
        let contract = MockContract::new();
        let id = goal_id(&owner(), Nonce::new(0));
        let broken = Goal {
            owner: owner(),
            description: "Broken".into(),
            stake: Wei::from_wei(1),
            judges: vec![judge_a()],
            required_approvals: 1,
            current_approvals: 1,
            verified_approvals: vec![false],
            milestone_descriptions: vec!["Only".into()],
            milestone_achieved: vec![false],
            completed: false,
            funds_released: true,
        };
        contract.insert_goal(id, broken.clone());

        let snapshot = GoalStateReader::new(&contract).read(id).await.unwrap();
        assert!(!snapshot.is_consistent());
        assert_eq!(snapshot.goal, broken);
        assert_eq!(snapshot.violations, broken.check_invariants());
        assert!(snapshot.violations.len() >= 2);
    }

    #[tokio::test]
    async fn unknown_goal_is_not_found() {
        let contract = MockContract::new();
        let id = goal_id(&owner(), Nonce::new(9));
        let err = GoalStateReader::new(&contract).read(id).await.unwrap_err();
        assert_eq!(err, ContractError::NotFound(id.to_string()));

        // The contract itself answers with a zeroed goal.
        assert!(contract.get_goal_details(id).await.unwrap().owner.is_zero());
    }

    #[tokio::test]
    async fn index_out_of_range_is_reported() {
        let contract = MockContract::new().as_account(owner());
        GoalActions::new(&contract, NonceStrategy::Refetch)
            .create(&draft("One"))
            .await
            .unwrap();

        let err = GoalNonceTracker::new(&contract)
            .resolve(GoalRef::Index(Nonce::new(1)), Some(owner()))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("goal index 1 is out of range: {} has 1 goal(s)", owner())
        );
    }
}
