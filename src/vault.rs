//! Token transfer collaborator (§1, §11) — out of scope for this crate.
//!
//! The engine never moves real tokens; `deposit`/`withdraw` call through a
//! host-supplied `&mut dyn TokenVault` so the ledger's own bookkeeping
//! (`Account::funds`) stays in lockstep with whatever custody mechanism the
//! host actually uses.

use crate::{types::{Address, Amount, Token}, Result};

/// Generic token movement primitive. Implementations live entirely outside
/// this crate; test doubles for the dispatcher's own tests are under
/// `tests/helpers`.
pub trait TokenVault {
    /// Pull `amount` of `token` from `from` into custody.
    fn pull(&mut self, token: Token, from: Address, amount: Amount) -> Result<()>;

    /// Push `amount` of `token` from custody to `to`.
    fn push(&mut self, token: Token, to: Address, amount: Amount) -> Result<()>;
}
