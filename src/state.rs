//! Data model: accounts, rails, and operator approvals (§3).

use crate::{
    rate_queue::RateChangeQueue,
    types::{Address, Amount, Epoch, Token},
};

/// A payer or payee's prepaid balance, keyed externally by `(Token, Address)`.
///
/// Lazily created on first deposit; never destroyed. `lockup_current` must
/// never exceed `funds` at any quiescent point (end of a top-level
/// command); see [`crate::lockup::settle_account_lockup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, borsh::BorshSerialize, borsh::BorshDeserialize)]
pub struct Account {
    /// Total deposited, not yet withdrawn or paid out.
    pub funds: Amount,
    /// Amount already locked against future commitments.
    pub lockup_current: Amount,
    /// Sum of `payment_rate` over all non-terminated rails where this
    /// account is the payer.
    pub lockup_rate: Amount,
    /// Epoch through which rate-driven lockup has been folded into
    /// `lockup_current`.
    pub lockup_last_settled_at: Epoch,
}

impl Account {
    pub fn available(&self) -> Amount {
        self.funds.saturating_sub(self.lockup_current)
    }
}

/// A unidirectional continuous payment commitment from `from` to `to` at
/// `payment_rate` per epoch, managed by `operator` and keyed externally by
/// a globally unique [`RailId`].
#[derive(Debug, Clone, PartialEq, Eq, borsh::BorshSerialize, borsh::BorshDeserialize)]
pub struct Rail {
    pub token: Token,
    pub from: Address,
    pub to: Address,
    pub operator: Address,
    /// Handle of the arbiter consulted during settlement, if any. The
    /// engine never constructs or calls the arbiter itself — the host
    /// supplies a `&mut dyn Arbiter` for each settlement call.
    pub arbiter: Option<Address>,

    pub is_active: bool,
    pub payment_rate: Amount,
    pub lockup_period: Epoch,
    pub lockup_fixed: Amount,
    pub settled_up_to: Epoch,
    /// 0 while active; otherwise the epoch termination was requested.
    pub termination_epoch: Epoch,
    pub rate_change_queue: RateChangeQueue,

    /// Per-rail modification-in-progress flag (§5).
    pub is_locked: bool,
}

impl Rail {
    pub(crate) fn new(
        token: Token,
        from: Address,
        to: Address,
        operator: Address,
        arbiter: Option<Address>,
        current_epoch: Epoch,
    ) -> Self {
        Self {
            token,
            from,
            to,
            operator,
            arbiter,
            is_active: true,
            payment_rate: 0,
            lockup_period: 0,
            lockup_fixed: 0,
            settled_up_to: current_epoch,
            termination_epoch: 0,
            rate_change_queue: RateChangeQueue::new(),
            is_locked: false,
        }
    }

    /// `termination_epoch + lockup_period` if terminating, else `None`.
    pub fn max_settlement_epoch(&self) -> Option<Epoch> {
        if self.termination_epoch == 0 {
            None
        } else {
            Some(self.termination_epoch + self.lockup_period)
        }
    }

    pub fn is_terminating(&self) -> bool {
        self.termination_epoch != 0
    }
}

/// Per-`(token, payer, operator)` allowance accounting (§4.C).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, borsh::BorshSerialize, borsh::BorshDeserialize)]
pub struct OperatorApproval {
    pub is_approved: bool,
    pub rate_allowance: Amount,
    pub lockup_allowance: Amount,
    pub rate_usage: Amount,
    pub lockup_usage: Amount,
}

impl OperatorApproval {
    pub fn terminate(&mut self) {
        self.is_approved = false;
        self.rate_allowance = 0;
        self.lockup_allowance = 0;
    }
}
