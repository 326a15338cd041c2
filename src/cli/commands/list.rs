//! list command - List an account's goals

use crate::cli::Context;
use crate::goals::nonce::GoalNonceTracker;
use crate::goals::reader::GoalStateReader;
use crate::ui::{output, render};
use anyhow::{Context as _, Result};
use serde_json::json;

/// List every goal created by `owner` (or the configured account).
pub fn list(ctx: &Context, owner: Option<&str>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(list_async(ctx, owner))
}

async fn list_async(ctx: &Context, owner: Option<&str>) -> Result<()> {
    let owner = ctx.require_owner(owner)?;
    let contract = ctx.contract()?;
    let ids = GoalNonceTracker::new(contract.as_ref())
        .goal_ids(&owner)
        .await
        .context("Failed to read goal nonce")?;

    let reader = GoalStateReader::new(contract.as_ref());
    let mut entries = Vec::with_capacity(ids.len());
    for (nonce, goal_id) in ids {
        let snapshot = reader
            .read(goal_id)
            .await
            .with_context(|| format!("Failed to read goal #{}", nonce))?;
        entries.push((nonce, snapshot));
    }

    if ctx.json {
        let goals: Vec<_> = entries
            .iter()
            .map(|(nonce, s)| {
                json!({
                    "nonce": nonce,
                    "goalId": s.goal_id,
                    "goal": s.goal,
                })
            })
            .collect();
        output::json(&json!({ "owner": owner, "goals": goals }))?;
        return Ok(());
    }

    if entries.is_empty() {
        output::print("No goals yet", ctx.verbosity);
        output::print("Create one to start your journey: akt create --help", ctx.verbosity);
        return Ok(());
    }

    for (nonce, snapshot) in &entries {
        println!("{}", render::goal_summary(*nonce, &snapshot.goal_id, &snapshot.goal));
        for violation in &snapshot.violations {
            output::warn(
                format!("goal #{} is inconsistent: {}", nonce, violation),
                ctx.verbosity,
            );
        }
    }
    Ok(())
}
