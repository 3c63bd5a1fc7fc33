//! Primitive aliases shared across the engine.

/// An opaque principal: payer, payee, operator, or arbiter handle.
///
/// The host supplies and authenticates callers; this crate never inspects
/// an `Address` beyond equality.
pub use solana_pubkey::Pubkey as Address;

/// Identifies a fungible token. Token transfer itself is out of scope
/// (see [`crate::vault::TokenVault`]); the ledger only partitions accounts
/// by `(Token, Address)`.
pub type Token = Address;

/// Monotonically non-decreasing logical clock supplied by the host
/// (block height in the original deployment).
pub type Epoch = u64;

/// Unbounded-range unsigned amount. `u128` comfortably covers any
/// realistic `rate * duration` product without the original deployment's
/// 256-bit headroom.
pub type Amount = u128;

/// Globally unique, monotonically assigned rail identifier.
pub type RailId = u64;
