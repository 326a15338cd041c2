//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Resolves goal references and calls into [`crate::goals`]
//! 3. Formats and displays output (JSON under `--json`)
//!
//! # Async Commands
//!
//! Commands that talk to the contract are async because they involve
//! network I/O. Each one builds a tokio runtime and blocks on its async
//! implementation, so dispatch itself stays synchronous.

mod approve;
mod completion;
mod config_cmd;
mod create;
mod id;
mod list;
mod milestone;
mod show;
mod watch;

// Re-export command functions for testing and direct invocation
pub use approve::approve;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use create::create;
pub use id::{id, nonce};
pub use list::list;
pub use milestone::milestone;
pub use show::show;
pub use watch::watch;

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::contract::GoalContract;
use crate::core::types::{Address, GoalId};
use crate::goals::nonce::GoalNonceTracker;
use crate::goals::GoalRef;
use crate::ui::prompts;
use anyhow::{bail, Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Id { owner, nonce } => id::id(ctx, &owner, &nonce),
        Command::Nonce { owner } => id::nonce(ctx, owner.as_deref()),
        Command::List { owner } => list::list(ctx, owner.as_deref()),
        Command::Show { goal, owner, web } => show::show(ctx, &goal, owner.as_deref(), web),
        Command::Create {
            description,
            judges,
            milestones,
            approvals,
            stake,
            yes,
        } => create::create(
            ctx,
            create::CreateArgs {
                description,
                judges,
                milestones,
                approvals,
                stake,
                yes,
            },
        ),
        Command::Approve { goal, owner, yes } => approve::approve(ctx, &goal, owner.as_deref(), yes),
        Command::Milestone { goal, number, yes } => milestone::milestone(ctx, &goal, number, yes),
        Command::Watch { goal, owner, count } => watch::watch(ctx, &goal, owner.as_deref(), count),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value, global } => config_cmd::set(ctx, &key, &value, global),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Resolve a goal hash or index typed by the user.
///
/// Indexes resolve under `owner`, falling back to the configured account.
pub(crate) async fn resolve_goal(
    ctx: &Context,
    contract: &dyn GoalContract,
    goal: &str,
    owner: Option<&str>,
) -> Result<GoalId> {
    let goal_ref = GoalRef::parse(goal)?;
    let owner: Option<Address> = ctx.owner_or_account(owner)?;
    GoalNonceTracker::new(contract)
        .resolve(goal_ref, owner)
        .await
        .with_context(|| format!("Failed to resolve goal '{}'", goal_ref))
}

/// Answer assumed when the user just presses Enter at a transaction prompt.
const SEND_BY_DEFAULT: bool = false;

/// Ask before sending a transaction unless `--yes` was given.
pub(crate) fn confirm_transaction(ctx: &Context, message: &str, yes: bool) -> Result<()> {
    if yes {
        return Ok(());
    }
    if !prompts::confirm(message, SEND_BY_DEFAULT, ctx.interactive)? {
        bail!("Cancelled.");
    }
    Ok(())
}
