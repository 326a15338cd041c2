//! cli
//!
//! Command-line interface layer for Akuntabel.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and build the command [`Context`]
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers resolve goal references, call into
//! [`crate::goals`] for reads and transactions, and format the results.
//! Nothing here talks JSON-RPC directly.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::contract::{create_contract, GoalContract};
use crate::core::config::Config;
use crate::core::types::Address;
use crate::ui::output::Verbosity;

/// Everything a command needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    /// Directory the command runs in (project config is read from here)
    pub cwd: PathBuf,
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Print JSON instead of human-readable output
    pub json: bool,
    /// Whether prompts may be shown
    pub interactive: bool,
    /// Merged configuration, CLI overrides applied
    pub config: Config,
}

impl Context {
    /// Build the contract backend from the configuration.
    pub fn contract(&self) -> Result<Box<dyn GoalContract>> {
        create_contract(&self.config).context(
            "No contract configured. Pass --contract or run 'akt config set contract <address>'",
        )
    }

    /// The configured account, if any.
    pub fn account(&self) -> Option<Address> {
        self.config.account()
    }

    /// `--owner` if given, otherwise the configured account.
    pub fn owner_or_account(&self, owner: Option<&str>) -> Result<Option<Address>> {
        match owner {
            Some(s) => Ok(Some(
                Address::parse(s).with_context(|| format!("Invalid --owner '{}'", s))?,
            )),
            None => Ok(self.account()),
        }
    }

    /// Like [`Context::owner_or_account`], but one of them is required.
    pub fn require_owner(&self, owner: Option<&str>) -> Result<Address> {
        self.owner_or_account(owner)?.ok_or_else(|| {
            anyhow::anyhow!("No account given. Pass --owner or --account, or configure an account.")
        })
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let cwd = match cli.cwd.clone() {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    let mut config = Config::load(Some(&cwd)).context("Failed to load configuration")?;
    config
        .apply_overrides(
            cli.rpc_url.as_deref(),
            cli.contract.as_deref(),
            cli.account.as_deref(),
        )
        .context("Invalid command-line override")?;

    let ctx = Context {
        cwd,
        verbosity,
        json: cli.json,
        interactive: cli.interactive(),
        config,
    };

    commands::dispatch(cli.command, &ctx)
}
