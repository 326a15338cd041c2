//! core
//!
//! Core domain types, identity derivation, and configuration for Akuntabel.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Address, GoalId, Nonce, Wei
//! - [`identity`] - Deterministic goal id derivation
//! - [`goal`] - Goal snapshot, invariants, and creation input
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Identity derivation is pure and needs no network access
//! - Snapshots are read-only; only the contract mutates goals

pub mod config;
pub mod goal;
pub mod identity;
pub mod types;
