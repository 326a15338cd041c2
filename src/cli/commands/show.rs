//! show command - Show a goal and the actions open to the viewer
//!
//! # Example
//!
//! ```bash
//! # By hash
//! akt show 0xb9382d35273c75a50631a3e84d3c75ec9266e2b18c35a627e16cdbf26a18ca85
//!
//! # The configured account's second goal
//! akt show 1
//! ```

use super::resolve_goal;
use crate::cli::Context;
use crate::core::types::GoalId;
use crate::goals::reader::GoalStateReader;
use crate::ui::{output, render};
use anyhow::{Context as _, Result};
use serde_json::json;

/// Show a goal.
pub fn show(ctx: &Context, goal: &str, owner: Option<&str>, web: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(show_async(ctx, goal, owner, web))
}

/// Link to the goal page of the web front end.
pub(crate) fn goal_url(base_url: &str, goal_id: &GoalId) -> String {
    format!("{}/goals/{}", base_url.trim_end_matches('/'), goal_id)
}

async fn show_async(ctx: &Context, goal: &str, owner: Option<&str>, web: bool) -> Result<()> {
    let contract = ctx.contract()?;
    let goal_id = resolve_goal(ctx, contract.as_ref(), goal, owner).await?;

    if web {
        let url = goal_url(ctx.config.web_base_url(), &goal_id);
        output::print(format!("Opening {}", url), ctx.verbosity);
        open::that(&url).with_context(|| format!("Failed to open {}", url))?;
        return Ok(());
    }

    let snapshot = GoalStateReader::new(contract.as_ref())
        .read(goal_id)
        .await
        .with_context(|| format!("Failed to read goal {}", goal_id))?;
    let viewer = ctx.account();
    let actions = render::affordances(&snapshot.goal, viewer.as_ref());

    if ctx.json {
        output::json(&json!({
            "goalId": goal_id,
            "goal": snapshot.goal,
            "violations": snapshot.violations.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
            "actions": actions,
        }))?;
        return Ok(());
    }

    println!("{}", render::goal_details(&goal_id, &snapshot.goal, viewer.as_ref()));
    for violation in &snapshot.violations {
        output::warn(format!("goal is inconsistent: {}", violation), ctx.verbosity);
    }
    Ok(())
}
