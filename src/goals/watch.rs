//! goals::watch
//!
//! Event-driven refetch of a single goal.
//!
//! The watcher remembers the next block to scan. Each poll fetches
//! `MilestoneAchieved` and `GoalApproved` logs up to the latest block, keeps
//! the ones for the watched goal, and re-reads the goal when any are found.
//! Blocks count as scanned only once that re-read succeeds, so a failed
//! refresh is retried with the same events on the next poll.
//! Dropping the watcher stops it.

use std::time::Duration;

use tracing::debug;

use super::reader::GoalView;
use crate::contract::{ContractError, GoalContract, GoalEvent};
use crate::core::goal::{Goal, GoalState};
use crate::core::types::GoalId;

/// Polls contract events for one goal.
pub struct GoalWatcher<'a> {
    contract: &'a dyn GoalContract,
    view: GoalView<'a>,
    next_block: u64,
}

impl<'a> GoalWatcher<'a> {
    /// Load the goal and start watching from the block after the current one.
    pub async fn start(contract: &'a dyn GoalContract, goal_id: GoalId) -> Result<Self, ContractError> {
        let latest = contract.block_number().await?;
        let mut view = GoalView::new(contract, goal_id);
        view.refresh().await?;
        debug!(goal_id = %goal_id, from_block = latest + 1, "watching goal");
        Ok(Self {
            contract,
            view,
            next_block: latest + 1,
        })
    }

    pub fn goal_id(&self) -> GoalId {
        self.view.goal_id()
    }

    pub fn state(&self) -> &GoalState {
        self.view.state()
    }

    /// The next block a poll will scan from.
    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// Scan new blocks once.
    ///
    /// Returns the events for the watched goal. When there are any, the
    /// goal has already been re-read.
    pub async fn poll(&mut self) -> Result<Vec<GoalEvent>, ContractError> {
        let latest = self.contract.block_number().await?;
        if latest < self.next_block {
            return Ok(Vec::new());
        }

        let goal_id = self.view.goal_id();
        let events: Vec<GoalEvent> = self
            .contract
            .goal_events(self.next_block, latest)
            .await?
            .into_iter()
            .filter(|e| e.goal_id() == goal_id)
            .collect();

        if !events.is_empty() {
            debug!(goal_id = %goal_id, count = events.len(), "goal changed, refreshing");
            self.view.refresh().await?;
        }
        self.next_block = latest + 1;
        Ok(events)
    }

    /// Poll every `interval`, calling `on_change` after each refresh.
    ///
    /// Stops after `limit` changes when given; otherwise runs until an error
    /// or until the future is dropped.
    pub async fn run<F>(&mut self, interval: Duration, limit: Option<usize>, mut on_change: F) -> Result<usize, ContractError>
    where
        F: FnMut(&[GoalEvent], &Goal),
    {
        let mut changes = 0;
        while limit.map_or(true, |l| changes < l) {
            tokio::time::sleep(interval).await;
            let events = self.poll().await?;
            if events.is_empty() {
                continue;
            }
            changes += 1;
            on_change(&events, &self.view.goal_or_default());
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::mock::{FailOn, MockContract};
    use crate::core::goal::CreateGoalRequest;
    use crate::core::identity::goal_id;
    use crate::core::types::{Address, Nonce, Wei};

    fn owner() -> Address {
        Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap()
    }

    async fn create(contract: &MockContract) -> GoalId {
        let nonce = contract.user_goal_nonce(&owner()).await.unwrap();
        contract
            .create_goal(&CreateGoalRequest {
                description: "Swim 1km".into(),
                judges: vec![Address::parse("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap()],
                milestones: vec!["200m".into(), "1km".into()],
                required_approvals: 1,
                stake: Wei::from_wei(1),
            })
            .await
            .unwrap();
        goal_id(&owner(), nonce)
    }

    #[tokio::test]
    async fn quiet_poll_returns_nothing() {
        let contract = MockContract::new().as_account(owner());
        let id = create(&contract).await;
        let mut watcher = GoalWatcher::start(&contract, id).await.unwrap();
        assert_eq!(watcher.next_block(), 2);
        assert!(watcher.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn milestone_event_triggers_refresh() {
        let contract = MockContract::new().as_account(owner());
        let id = create(&contract).await;
        let mut watcher = GoalWatcher::start(&contract, id).await.unwrap();
        assert_eq!(watcher.state().goal().unwrap().milestones_completed(), 0);

        contract.achieve_milestone(id, 0).await.unwrap();
        let events = watcher.poll().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(watcher.state().goal().unwrap().milestones_completed(), 1);

        // Already scanned.
        assert!(watcher.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_goals_are_ignored() {
        let contract = MockContract::new().as_account(owner());
        let watched = create(&contract).await;
        let other = create(&contract).await;
        let mut watcher = GoalWatcher::start(&contract, watched).await.unwrap();

        contract.achieve_milestone(other, 0).await.unwrap();
        assert!(watcher.poll().await.unwrap().is_empty());
        assert_eq!(watcher.state().goal().unwrap().milestones_completed(), 0);
    }

    #[tokio::test]
    async fn run_stops_at_limit() {
        let contract = MockContract::new().as_account(owner());
        let id = create(&contract).await;
        let mut watcher = GoalWatcher::start(&contract, id).await.unwrap();
        contract.achieve_milestone(id, 0).await.unwrap();

        let mut seen = Vec::new();
        let changes = watcher
            .run(Duration::from_millis(1), Some(1), |events, goal| {
                seen.extend_from_slice(events);
                assert_eq!(goal.milestones_completed(), 1);
            })
            .await
            .unwrap();
        assert_eq!(changes, 1);
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn poll_errors_are_returned() {
        let contract = MockContract::new().as_account(owner());
        let id = create(&contract).await;
        let mut watcher = GoalWatcher::start(&contract, id).await.unwrap();

        let failing = contract
            .clone()
            .fail_on(FailOn::GoalEvents(ContractError::NetworkError("down".into())));
        failing.achieve_milestone(id, 0).await.unwrap();
        assert!(watcher.poll().await.is_err());
    }

    #[tokio::test]
    async fn failed_refresh_is_retried_on_next_poll() {
        let contract = MockContract::new().as_account(owner());
        let id = create(&contract).await;
        let mut watcher = GoalWatcher::start(&contract, id).await.unwrap();
        let from = watcher.next_block();

        contract.achieve_milestone(id, 0).await.unwrap();
        let flaky = contract
            .clone()
            .fail_on(FailOn::GetGoalDetails(ContractError::NetworkError("blip".into())));
        assert!(watcher.poll().await.is_err());
        assert_eq!(watcher.next_block(), from);

        flaky.clear_fail_on();
        let events = watcher.poll().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(watcher.state().goal().unwrap().milestones_completed(), 1);
        assert!(watcher.next_block() > from);
    }
}
