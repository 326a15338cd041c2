//! approve command - Approve a completed goal as one of its judges

use super::{confirm_transaction, resolve_goal};
use crate::cli::Context;
use crate::goals::actions::{ActionOutcome, GoalActions};
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::json;

/// Approve a goal.
pub fn approve(ctx: &Context, goal: &str, owner: Option<&str>, yes: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(approve_async(ctx, goal, owner, yes))
}

async fn approve_async(ctx: &Context, goal: &str, owner: Option<&str>, yes: bool) -> Result<()> {
    let contract = ctx.contract()?;
    let goal_id = resolve_goal(ctx, contract.as_ref(), goal, owner).await?;

    confirm_transaction(ctx, &format!("Approve goal {}?", goal_id), yes)?;

    let outcome = GoalActions::new(contract.as_ref(), ctx.config.nonce_strategy())
        .approve(goal_id)
        .await
        .with_context(|| format!("Failed to approve goal {}", goal_id))?;

    report(ctx, "Goal approved", &outcome)
}

/// Print the outcome of a goal transaction.
pub(crate) fn report(ctx: &Context, headline: &str, outcome: &ActionOutcome) -> Result<()> {
    if ctx.json {
        output::json(&json!({
            "receipt": outcome.receipt,
            "goal": outcome.goal,
            "warnings": outcome.warnings,
        }))?;
        return Ok(());
    }

    for warning in &outcome.warnings {
        output::warn(warning, ctx.verbosity);
    }
    output::success(
        format!(
            "{} in block {} (tx {})",
            headline,
            outcome.receipt.block_number,
            output::format_short_hex(&outcome.receipt.tx_hash)
        ),
        ctx.verbosity,
    );
    if let Some(goal) = &outcome.goal {
        output::print(
            format!(
                "Approvals: {} / {} Needed | Milestones: {} / {} | Funds {}",
                goal.current_approvals,
                goal.required_approvals,
                goal.milestones_completed(),
                goal.milestone_count(),
                if goal.funds_released { "Released" } else { "Locked" }
            ),
            ctx.verbosity,
        );
    }
    Ok(())
}
