//! id and nonce commands - Goal identity
//!
//! `id` derives a goal id offline. `nonce` reads an account's goal count
//! from the contract.

use crate::cli::Context;
use crate::core::identity::goal_id;
use crate::core::types::{Address, Nonce};
use crate::goals::nonce::GoalNonceTracker;
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::json;

/// Print the goal id for `owner` and `nonce`.
pub fn id(ctx: &Context, owner: &str, nonce: &str) -> Result<()> {
    let owner = Address::parse(owner).with_context(|| format!("Invalid owner '{}'", owner))?;
    let nonce = Nonce::parse(nonce)?;
    let id = goal_id(&owner, nonce);

    if ctx.json {
        output::json(&json!({
            "owner": owner,
            "nonce": nonce,
            "goalId": id,
        }))?;
    } else {
        println!("{}", id);
    }
    Ok(())
}

/// Print how many goals an account has created.
pub fn nonce(ctx: &Context, owner: Option<&str>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(nonce_async(ctx, owner))
}

async fn nonce_async(ctx: &Context, owner: Option<&str>) -> Result<()> {
    let owner = ctx.require_owner(owner)?;
    let contract = ctx.contract()?;
    let nonce = GoalNonceTracker::new(contract.as_ref())
        .current(&owner)
        .await
        .context("Failed to read goal nonce")?;

    if ctx.json {
        output::json(&json!({ "owner": owner, "nonce": nonce }))?;
    } else {
        println!("{}", nonce);
    }
    Ok(())
}
