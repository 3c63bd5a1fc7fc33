//! Core state machine of a continuous-stream payment ledger.
//!
//! Payers fund prepaid balances, operators open and modify payment rails
//! from a payer to a payee at a fixed rate per epoch, and arbiters may
//! adjudicate disputed settlement amounts. Every transition is driven by
//! an externally supplied, monotonically non-decreasing `Epoch`, so the
//! engine is a pure function of its command stream.
//!
//! Token movement, host-level authorization, and persistence are external
//! collaborators: see [`vault::TokenVault`] and [`settlement::Arbiter`].
//! This crate only computes the numbers and enforces the invariants.

pub mod approval;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod lockup;
pub mod rate_queue;
pub mod settlement;
pub mod state;
pub mod types;
pub mod vault;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::Ledger;
pub use types::{Address, Amount, Epoch, RailId, Token};

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, LedgerError>;
