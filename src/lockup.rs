//! Component B: account lockup settler (§4.B).

use crate::{state::Account, types::Epoch};

/// Result of folding elapsed epochs' rate commitment into `lockup_current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockupSettlement {
    /// True if the account is settled exactly through `current_epoch`.
    pub fully_settled: bool,
    /// The epoch `lockup_last_settled_at` was advanced to.
    pub settled_upto: Epoch,
}

/// Advances `account.lockup_last_settled_at`, converting elapsed epochs
/// times `lockup_rate` into `lockup_current`, and detects the largest
/// whole epoch through which the account can still afford its own rate
/// commitment.
///
/// Idempotent: calling this twice at the same `current_epoch` with no
/// intervening mutation returns the same result and mutates nothing the
/// second time.
pub fn settle_account_lockup(account: &mut Account, current_epoch: Epoch) -> LockupSettlement {
    let elapsed = current_epoch.saturating_sub(account.lockup_last_settled_at);
    if elapsed == 0 {
        return LockupSettlement {
            fully_settled: true,
            settled_upto: account.lockup_last_settled_at,
        };
    }

    if account.lockup_rate == 0 {
        account.lockup_last_settled_at = current_epoch;
        return LockupSettlement {
            fully_settled: true,
            settled_upto: current_epoch,
        };
    }

    let additional = account.lockup_rate * elapsed as u128;
    if account.funds >= account.lockup_current + additional {
        account.lockup_current += additional;
        account.lockup_last_settled_at = current_epoch;
        return LockupSettlement {
            fully_settled: true,
            settled_upto: current_epoch,
        };
    }

    let available = account.funds.saturating_sub(account.lockup_current);
    if available == 0 {
        return LockupSettlement {
            fully_settled: false,
            settled_upto: account.lockup_last_settled_at,
        };
    }

    let k = (available / account.lockup_rate) as u64;
    account.lockup_current += account.lockup_rate * k as u128;
    account.lockup_last_settled_at += k;
    LockupSettlement {
        fully_settled: false,
        settled_upto: account.lockup_last_settled_at,
    }
}
