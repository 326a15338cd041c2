//! milestone command - Mark a milestone as achieved
//!
//! Milestones are numbered from 1 on the command line and from 0 in the
//! contract.

use super::approve::report;
use super::{confirm_transaction, resolve_goal};
use crate::cli::Context;
use crate::goals::actions::GoalActions;
use anyhow::{bail, Context as _, Result};

/// Mark milestone `number` (one-based) of a goal as achieved.
pub fn milestone(ctx: &Context, goal: &str, number: u64, yes: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(milestone_async(ctx, goal, number, yes))
}

async fn milestone_async(ctx: &Context, goal: &str, number: u64, yes: bool) -> Result<()> {
    let Some(index) = number.checked_sub(1) else {
        bail!("Milestones are numbered from 1.");
    };

    let contract = ctx.contract()?;
    let goal_id = resolve_goal(ctx, contract.as_ref(), goal, None).await?;

    confirm_transaction(
        ctx,
        &format!("Mark milestone {} of goal {} as achieved?", number, goal_id),
        yes,
    )?;

    let outcome = GoalActions::new(contract.as_ref(), ctx.config.nonce_strategy())
        .achieve_milestone(goal_id, index)
        .await
        .with_context(|| format!("Failed to mark milestone {}", number))?;

    report(ctx, &format!("Milestone {} achieved", number), &outcome)
}
