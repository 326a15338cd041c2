//! create command - Create a goal and stake ether on it
//!
//! The draft is validated before any network call. After the transaction
//! confirms, the new goal id is derived with the configured nonce strategy
//! and verified by reading the goal back.

use super::confirm_transaction;
use crate::cli::Context;
use crate::core::goal::GoalDraft;
use crate::core::identity::NonceStrategy;
use crate::goals::actions::GoalActions;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};
use serde_json::json;

/// Arguments for `akt create`.
#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub description: String,
    pub judges: Vec<String>,
    pub milestones: Vec<String>,
    pub approvals: u64,
    pub stake: String,
    pub yes: bool,
}

impl CreateArgs {
    fn draft(&self) -> GoalDraft {
        GoalDraft {
            description: self.description.clone(),
            judges: self.judges.clone(),
            milestones: self.milestones.clone(),
            required_approvals: self.approvals,
            stake: self.stake.clone(),
        }
    }
}

/// Create a goal.
pub fn create(ctx: &Context, args: CreateArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(create_async(ctx, args))
}

async fn create_async(ctx: &Context, args: CreateArgs) -> Result<()> {
    let request = match args.draft().validate() {
        Ok(request) => request,
        Err(errors) => {
            for error in &errors.0 {
                output::error(error);
            }
            bail!("Goal is invalid ({} problem(s)); nothing was sent.", errors.0.len());
        }
    };

    let contract = ctx.contract()?;
    let account = contract
        .sender()
        .ok_or_else(|| anyhow::anyhow!("No account configured. Pass --account or run 'akt config set account <address>'."))?;

    if !ctx.json {
        output::print(format!("Goal:      {}", request.description), ctx.verbosity);
        output::print(format!("Stake:     {} ETH", request.stake), ctx.verbosity);
        output::print(
            format!(
                "Judges:    {} ({} approval(s) needed)",
                request.judges.len(),
                request.required_approvals
            ),
            ctx.verbosity,
        );
        output::print(format!("Milestones: {}", request.milestones.len()), ctx.verbosity);
    }
    confirm_transaction(
        ctx,
        &format!("Stake {} ETH from {}?", request.stake, account),
        args.yes,
    )?;

    let outcome = GoalActions::new(contract.as_ref(), ctx.config.nonce_strategy())
        .create_validated(&request)
        .await
        .context("Failed to create goal")?;

    if ctx.json {
        output::json(&json!({
            "goalId": outcome.goal_id,
            "receipt": outcome.receipt,
            "nonceStrategy": outcome.strategy.name(),
            "verified": outcome.verification.is_confirmed(),
            "verification": outcome.verification.to_string(),
        }))?;
        return Ok(());
    }

    output::success(
        format!(
            "Goal created in block {} (tx {})",
            outcome.receipt.block_number,
            output::format_short_hex(&outcome.receipt.tx_hash)
        ),
        ctx.verbosity,
    );
    match outcome.goal_id {
        Some(goal_id) => println!("{}", goal_id),
        None => output::warn(
            format!(
                "the goal exists but its id could not be derived; do not resend. Find it with 'akt list --owner {}'",
                account
            ),
            ctx.verbosity,
        ),
    }
    if !outcome.verification.is_confirmed() {
        output::warn(
            format!(
                "goal id derived with the '{}' nonce strategy did not verify: {}",
                outcome.strategy, outcome.verification
            ),
            ctx.verbosity,
        );
        output::warn(
            format!(
                "if this keeps happening, try 'akt config set identity.nonce_strategy {}'",
                alternative_strategy(outcome.strategy)
            ),
            ctx.verbosity,
        );
    }
    Ok(())
}

/// The strategy to suggest when `current` fails to verify.
fn alternative_strategy(current: NonceStrategy) -> NonceStrategy {
    match current {
        NonceStrategy::Refetch => NonceStrategy::PreCapture,
        NonceStrategy::PreCapture => NonceStrategy::Refetch,
    }
}
