//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output
//! - `--no-interactive`: Never prompt
//! - `--rpc-url`, `--contract`, `--account`: Override configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Akuntabel - stake on your goals, let your judges decide
#[derive(Parser, Debug)]
#[command(name = "akt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if akt was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// JSON-RPC endpoint (overrides config)
    #[arg(long, global = true, value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Goal contract address (overrides config)
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub contract: Option<String>,

    /// Account to read as and send transactions from (overrides config)
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub account: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Returns true unless `--no-interactive`, `--quiet` or `--json` was set,
    /// or stdin is not a terminal.
    pub fn interactive(&self) -> bool {
        if self.no_interactive || self.quiet || self.json {
            false
        } else {
            crate::ui::prompts::is_interactive()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute a goal id from an owner and nonce
    #[command(
        name = "id",
        long_about = "Compute a goal id from an owner address and nonce.\n\n\
            A goal id is keccak256 of the 20-byte owner address followed by the \
            nonce as a 32-byte big-endian integer. This runs entirely offline.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Id of the first goal created by an account
    akt id 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266 0"
    )]
    Id {
        /// Owner address
        owner: String,

        /// Goal nonce (0 for the owner's first goal)
        #[arg(allow_hyphen_values = true)]
        nonce: String,
    },

    /// Show how many goals an account has created
    Nonce {
        /// Account to query (defaults to the configured account)
        #[arg(long)]
        owner: Option<String>,
    },

    /// List an account's goals
    #[command(
        name = "list",
        long_about = "List every goal an account has created.\n\n\
            Reads the account's goal nonce from the contract, derives each goal id, \
            and prints a summary of each goal, oldest first.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Your own goals
    akt list

    # Someone else's goals
    akt list --owner 0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
    )]
    List {
        /// Account whose goals to list (defaults to the configured account)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show a goal
    #[command(
        name = "show",
        long_about = "Show a goal's full state.\n\n\
            GOAL is either a goal hash (0x followed by 64 hex digits) or an index \
            into an owner's goals. Indexes resolve under --owner or the configured \
            account. The output ends with the actions available to the configured \
            account: judges can approve, owners can mark milestones.",
        after_help = "\
WORKFLOW EXAMPLES:
    # By hash
    akt show 0xb9382d35273c75a50631a3e84d3c75ec9266e2b18c35a627e16cdbf26a18ca85

    # Your first goal
    akt show 0

    # Open the goal page in the browser
    akt show 0 --web"
    )]
    Show {
        /// Goal hash or index
        #[arg(allow_hyphen_values = true)]
        goal: String,

        /// Owner to resolve an index under
        #[arg(long)]
        owner: Option<String>,

        /// Open the goal page in the browser
        #[arg(long)]
        web: bool,
    },

    /// Create a goal and stake ether on it
    #[command(
        name = "create",
        long_about = "Create a goal with judges and milestones, staking ether on it.\n\n\
            All fields are validated locally before anything is sent. After the \
            transaction confirms, the new goal id is derived from the account's \
            nonce and verified by reading the goal back.",
        after_help = "\
WORKFLOW EXAMPLES:
    # One judge, two milestones
    akt create --description 'Run a marathon' \\
        --judge 0x70997970C51812dc3A010C7d01b50e0d17dc79C8 \\
        --milestone 'Run 10k' --milestone 'Run 42k' \\
        --approvals 1 --stake 0.01"
    )]
    Create {
        /// What the goal is
        #[arg(long, short)]
        description: String,

        /// Judge address (repeat for more judges)
        #[arg(long = "judge", value_name = "ADDRESS")]
        judges: Vec<String>,

        /// Milestone description (repeat for more milestones)
        #[arg(long = "milestone", value_name = "TEXT")]
        milestones: Vec<String>,

        /// Judge approvals required to release the stake
        #[arg(long, default_value_t = 1)]
        approvals: u64,

        /// Stake in ether
        #[arg(long, default_value = "0.01")]
        stake: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Approve a completed goal as a judge
    Approve {
        /// Goal hash or index
        #[arg(allow_hyphen_values = true)]
        goal: String,

        /// Owner to resolve an index under
        #[arg(long)]
        owner: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark one of your goal's milestones as achieved
    Milestone {
        /// Goal hash or index
        #[arg(allow_hyphen_values = true)]
        goal: String,

        /// Milestone number, starting at 1
        number: u64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Follow a goal and print each change
    #[command(
        name = "watch",
        long_about = "Follow a goal's MilestoneAchieved and GoalApproved events.\n\n\
            Each time an event for the goal appears, the goal is read again and the \
            new state is printed. Runs until interrupted or until --count changes \
            have been seen."
    )]
    Watch {
        /// Goal hash or index
        #[arg(allow_hyphen_values = true)]
        goal: String,

        /// Owner to resolve an index under
        #[arg(long)]
        owner: Option<String>,

        /// Stop after this many changes
        #[arg(long)]
        count: Option<usize>,
    },

    /// Get or set configuration values
    #[command(
        name = "config",
        long_about = "Get or set configuration values.\n\n\
            Global configuration lives in ~/.akuntabel/config.toml (or \
            $AKUNTABEL_CONFIG). Project configuration lives in \
            .akuntabel/config.toml and takes precedence.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List effective configuration
    akt config list

    # Point at a deployed contract
    akt config set contract 0x5FbDB2315678afecb367f032d93F642f64180aa3 --global

    # Read a value
    akt config get rpc_url"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    akt completion bash >> ~/.bashrc

    # Zsh
    akt completion zsh > ~/.zfunc/_akt"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
        /// Write to the global config instead of the project config
        #[arg(long)]
        global: bool,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
