//! Component C: operator approval accountant (§4.C).

use crate::{error::LedgerError, state::OperatorApproval, types::Amount, Result};

/// Admits or rejects a combined rate/lockup change against an operator's
/// allowances, updating usage in place.
///
/// `old_total`/`new_total` are `rate * lockup_period + lockup_fixed` before
/// and after the change (§4.C); callers compute these from the rail's
/// current and proposed fields. Decreases are always admitted, even past a
/// since-reduced allowance, so that previously honored commitments are
/// never retroactively rejected — only the usage counter saturates down.
pub fn validate_and_modify_rate_change(
    approval: &mut OperatorApproval,
    old_rate: Amount,
    new_rate: Amount,
    old_total: Amount,
    new_total: Amount,
) -> Result<()> {
    apply_delta(
        &mut approval.lockup_usage,
        approval.lockup_allowance,
        old_total,
        new_total,
    )?;
    apply_delta(&mut approval.rate_usage, approval.rate_allowance, old_rate, new_rate)?;
    Ok(())
}

/// Same delta logic as [`validate_and_modify_rate_change`], restricted to
/// the lockup allowance only — used by `modify_rail_lockup`, where the
/// rate does not change.
pub fn validate_and_modify_lockup_change(
    approval: &mut OperatorApproval,
    old_total: Amount,
    new_total: Amount,
) -> Result<()> {
    apply_delta(&mut approval.lockup_usage, approval.lockup_allowance, old_total, new_total)
}

fn apply_delta(usage: &mut Amount, allowance: Amount, old: Amount, new: Amount) -> Result<()> {
    if new > old {
        let delta = new - old;
        let projected = usage.checked_add(delta).ok_or(LedgerError::Arithmetic)?;
        if projected > allowance {
            return Err(LedgerError::AllowanceExceeded);
        }
        *usage = projected;
    } else if new < old {
        let delta = old - new;
        *usage = usage.saturating_sub(delta);
    }
    Ok(())
}
