//! Akuntabel - stake ether on a goal, let judges release it
//!
//! A goal has an owner, a stake, a list of judges with a required number of
//! approvals, and a list of milestones. The owner marks milestones as
//! achieved; once every milestone is achieved the judges may approve, and
//! enough approvals release the stake. All state lives in the goal
//! contract; this crate reads it and sends transactions.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to goals)
//! - [`goals`] - Goal references, reads, transactions, and event watching
//! - [`contract`] - The goal contract: ABI codec, JSON-RPC and mock backends
//! - [`core`] - Domain types, goal identity, goal snapshots, configuration
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! 1. A goal id is `keccak256(owner ‖ nonce)` with the nonce as a 32-byte
//!    big-endian integer; it is derived locally and never trusted blindly
//! 2. Goal state is only changed by contract transactions
//! 3. Goal creation input is validated completely before anything is sent
//! 4. Fetched snapshots are checked against the goal invariants and
//!    reported, never repaired

pub mod cli;
pub mod contract;
pub mod core;
pub mod goals;
pub mod ui;
