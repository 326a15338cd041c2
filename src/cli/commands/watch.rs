//! watch command - Follow a goal's events
//!
//! Prints the goal once, then a line per change until interrupted or until
//! `--count` changes have been seen. Under `--json` each change is one JSON
//! document.

use super::resolve_goal;
use crate::cli::Context;
use crate::goals::watch::GoalWatcher;
use crate::ui::{output, render};
use anyhow::{Context as _, Result};
use serde_json::json;

/// Watch a goal.
pub fn watch(ctx: &Context, goal: &str, owner: Option<&str>, count: Option<usize>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(watch_async(ctx, goal, owner, count))
}

async fn watch_async(ctx: &Context, goal: &str, owner: Option<&str>, count: Option<usize>) -> Result<()> {
    let contract = ctx.contract()?;
    let goal_id = resolve_goal(ctx, contract.as_ref(), goal, owner).await?;

    let mut watcher = GoalWatcher::start(contract.as_ref(), goal_id)
        .await
        .with_context(|| format!("Failed to read goal {}", goal_id))?;

    if !ctx.json {
        if let Some(goal) = watcher.state().goal() {
            println!("{}", render::goal_details(&goal_id, goal, ctx.account().as_ref()));
        }
        output::print(
            format!("\nWatching from block {} (Ctrl-C to stop)", watcher.next_block()),
            ctx.verbosity,
        );
    }

    let json = ctx.json;
    let verbosity = ctx.verbosity;
    watcher
        .run(ctx.config.poll_interval(), count, |events, goal| {
            if json {
                if let Err(e) = output::json(&json!({ "events": events, "goal": goal })) {
                    output::error(e);
                }
                return;
            }
            for event in events {
                output::print(event, verbosity);
            }
            output::print(
                format!(
                    "  Approvals: {} / {} Needed | Milestones: {} / {} | {}",
                    goal.current_approvals,
                    goal.required_approvals,
                    goal.milestones_completed(),
                    goal.milestone_count(),
                    if goal.funds_released { "Funds Released" } else { "Funds Locked" }
                ),
                verbosity,
            );
        })
        .await
        .context("Stopped watching")?;
    Ok(())
}
