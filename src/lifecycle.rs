//! Component E: rail lifecycle controller (§4.E).
//!
//! Creates, modifies, terminates, and finalizes rails, and performs the
//! account-level deposit/withdraw commands the spec groups alongside them.
//! Settlement (component D) is invoked directly from [`modify_rail_payment`]
//! when a rate change must be flushed before it can take effect.

use crate::{
    approval::{validate_and_modify_lockup_change, validate_and_modify_rate_change},
    config::LedgerConfig,
    error::LedgerError,
    lockup::settle_account_lockup,
    settlement::settle_rail,
    state::{Account, OperatorApproval, Rail},
    types::{Address, Amount, Epoch, RailId, Token},
    Result,
};

/// `create_rail(token, from, to, arbiter)`, operator = `caller`.
#[allow(clippy::too_many_arguments)]
pub fn create_rail(
    token: Token,
    from: Address,
    to: Address,
    operator: Address,
    arbiter: Option<Address>,
    approval: &OperatorApproval,
    from_account: &Account,
    to_account: &Account,
    current_epoch: Epoch,
    config: &LedgerConfig,
) -> Result<Rail> {
    if !approval.is_approved {
        return Err(LedgerError::OperatorNotApproved);
    }
    if let Some(restricted) = config.restrict_operator_arbiter {
        if arbiter != Some(restricted) {
            return Err(LedgerError::AuthorizationDenied);
        }
    }
    if config.require_nonzero_rail_endpoints
        && (from_account.funds == 0 || to_account.funds == 0)
    {
        return Err(LedgerError::InsufficientFunds);
    }
    Ok(Rail::new(token, from, to, operator, arbiter, current_epoch))
}

/// `modify_rail_lockup(rail_id, period, fixed)`, operator-only.
pub fn modify_rail_lockup(
    rail: &mut Rail,
    payer: &mut Account,
    approval: &mut OperatorApproval,
    caller: Address,
    new_period: Epoch,
    new_fixed: Amount,
    current_epoch: Epoch,
) -> Result<()> {
    if caller != rail.operator {
        return Err(LedgerError::AuthorizationDenied);
    }

    let settlement = settle_account_lockup(payer, current_epoch);
    if !(settlement.fully_settled && settlement.settled_upto == current_epoch) {
        return Err(LedgerError::LockupNotSettled);
    }

    if rail.is_terminating() && (new_period != rail.lockup_period || new_fixed > rail.lockup_fixed) {
        return Err(LedgerError::TerminatedRailRestriction);
    }

    let old_total = rail
        .payment_rate
        .checked_mul(rail.lockup_period as u128)
        .ok_or(LedgerError::Arithmetic)?
        .checked_add(rail.lockup_fixed)
        .ok_or(LedgerError::Arithmetic)?;
    let new_total = rail
        .payment_rate
        .checked_mul(new_period as u128)
        .ok_or(LedgerError::Arithmetic)?
        .checked_add(new_fixed)
        .ok_or(LedgerError::Arithmetic)?;

    validate_and_modify_lockup_change(approval, old_total, new_total)?;

    if new_total > old_total {
        let delta = new_total - old_total;
        let updated = payer.lockup_current.checked_add(delta).ok_or(LedgerError::Arithmetic)?;
        if updated > payer.funds {
            return Err(LedgerError::InsufficientFunds);
        }
        payer.lockup_current = updated;
    } else if new_total < old_total {
        let delta = old_total - new_total;
        payer.lockup_current = payer
            .lockup_current
            .checked_sub(delta)
            .ok_or(LedgerError::InvariantBroken)?;
    }

    rail.lockup_period = new_period;
    rail.lockup_fixed = new_fixed;
    log::debug!("rail lockup modified: period={new_period} fixed={new_fixed}");
    Ok(())
}

/// `modify_rail_payment(rail_id, new_rate, one_time_payment)`, operator-only.
///
/// Never consults an arbiter itself: a rate change on an arbitered rail is
/// queued for the next [`settle_rail`] call instead of settled inline (see
/// the `needs_enqueue` branch below), and a rate change on a rail with no
/// arbiter has none to consult.
#[allow(clippy::too_many_arguments)]
pub fn modify_rail_payment(
    rail_id: RailId,
    rail: &mut Rail,
    payer: &mut Account,
    payee: &mut Account,
    approval: &mut OperatorApproval,
    caller: Address,
    new_rate: Amount,
    one_time_payment: Amount,
    current_epoch: Epoch,
) -> Result<()> {
    if caller != rail.operator {
        return Err(LedgerError::AuthorizationDenied);
    }

    let old_rate = rail.payment_rate;

    if rail.is_terminating() && (new_rate > old_rate || one_time_payment > rail.lockup_fixed) {
        return Err(LedgerError::TerminatedRailRestriction);
    }
    if one_time_payment > rail.lockup_fixed {
        return Err(LedgerError::InsufficientLockup);
    }

    let settlement = settle_account_lockup(payer, current_epoch);

    if new_rate > old_rate && !(settlement.fully_settled && settlement.settled_upto == current_epoch)
    {
        return Err(LedgerError::LockupNotSettled);
    }

    if new_rate != old_rate && current_epoch >= payer.lockup_last_settled_at + rail.lockup_period {
        return Err(LedgerError::DebtBlocked);
    }

    let old_total = old_rate
        .checked_mul(rail.lockup_period as u128)
        .ok_or(LedgerError::Arithmetic)?
        .checked_add(rail.lockup_fixed)
        .ok_or(LedgerError::Arithmetic)?;
    let new_total = new_rate
        .checked_mul(rail.lockup_period as u128)
        .ok_or(LedgerError::Arithmetic)?
        .checked_add(rail.lockup_fixed)
        .ok_or(LedgerError::Arithmetic)?;
    validate_and_modify_rate_change(approval, old_rate, new_rate, old_total, new_total)?;

    if new_rate != old_rate {
        if rail.arbiter.is_none() {
            let outcome = settle_rail(
                rail_id,
                rail,
                payer,
                payee,
                current_epoch,
                current_epoch,
                false,
                None,
            )?;
            if outcome.final_epoch != current_epoch {
                return Err(LedgerError::LockupNotSettled);
            }
        } else {
            let needs_enqueue = match rail.rate_change_queue.peek() {
                None => true,
                Some(head) => head.until_epoch != current_epoch,
            };
            if needs_enqueue {
                rail.rate_change_queue.enqueue(old_rate, current_epoch);
            }
        }
    }

    let elapsed = current_epoch.saturating_sub(payer.lockup_last_settled_at);
    let effective_period = rail
        .lockup_period
        .checked_sub(elapsed)
        .ok_or(LedgerError::InvariantBroken)?;
    let required = old_rate
        .checked_mul(effective_period as u128)
        .ok_or(LedgerError::Arithmetic)?
        .checked_add(one_time_payment)
        .ok_or(LedgerError::Arithmetic)?;
    if payer.lockup_current < required {
        return Err(LedgerError::InsufficientLockup);
    }
    if rail.lockup_fixed < one_time_payment {
        return Err(LedgerError::InsufficientLockup);
    }

    rail.lockup_fixed -= one_time_payment;
    rail.payment_rate = new_rate;
    if !rail.is_terminating() {
        payer.lockup_rate = payer
            .lockup_rate
            .checked_sub(old_rate)
            .ok_or(LedgerError::Arithmetic)?
            .checked_add(new_rate)
            .ok_or(LedgerError::Arithmetic)?;
    }

    let rate_delta = new_rate.abs_diff(old_rate);
    let rate_delta_amount = rate_delta
        .checked_mul(effective_period as u128)
        .ok_or(LedgerError::Arithmetic)?;
    payer.lockup_current = if new_rate >= old_rate {
        payer
            .lockup_current
            .checked_add(rate_delta_amount)
            .ok_or(LedgerError::Arithmetic)?
            .checked_sub(one_time_payment)
            .ok_or(LedgerError::InvariantBroken)?
    } else {
        payer
            .lockup_current
            .checked_sub(rate_delta_amount)
            .ok_or(LedgerError::InvariantBroken)?
            .checked_sub(one_time_payment)
            .ok_or(LedgerError::InvariantBroken)?
    };

    payer.funds = payer
        .funds
        .checked_sub(one_time_payment)
        .ok_or(LedgerError::InsufficientFunds)?;
    payee.funds = payee.funds.checked_add(one_time_payment).ok_or(LedgerError::Arithmetic)?;

    if payer.lockup_current > payer.funds {
        return Err(LedgerError::InvariantBroken);
    }

    if new_rate < old_rate {
        let resettlement = settle_account_lockup(payer, current_epoch);
        if !(resettlement.fully_settled && resettlement.settled_upto == current_epoch) {
            return Err(LedgerError::LockupNotSettled);
        }
    }

    log::debug!("rail payment modified: rate {old_rate}->{new_rate} one_time={one_time_payment}");
    Ok(())
}

/// `terminate_rail(rail_id)`, callable by payer, operator, or payee.
pub fn terminate_rail(
    rail: &mut Rail,
    payer: &mut Account,
    caller: Address,
    current_epoch: Epoch,
) -> Result<()> {
    if caller != rail.from && caller != rail.operator && caller != rail.to {
        return Err(LedgerError::AuthorizationDenied);
    }
    if rail.is_terminating() || !rail.is_active {
        return Err(LedgerError::EntityInactive);
    }
    rail.termination_epoch = current_epoch;
    payer.lockup_rate = payer
        .lockup_rate
        .checked_sub(rail.payment_rate)
        .ok_or(LedgerError::Arithmetic)?;
    log::debug!("rail terminated at epoch {current_epoch}");
    Ok(())
}

/// `deposit(token, to, amount)`: credits `to` then folds in deferred lockup.
pub fn deposit(account: &mut Account, amount: Amount, current_epoch: Epoch) -> Result<()> {
    account.funds = account.funds.checked_add(amount).ok_or(LedgerError::Arithmetic)?;
    settle_account_lockup(account, current_epoch);
    Ok(())
}

/// `withdraw(token, amount)` / `withdraw_to(token, to, amount)`, owner-only.
pub fn withdraw(account: &mut Account, amount: Amount, current_epoch: Epoch) -> Result<()> {
    let settlement = settle_account_lockup(account, current_epoch);
    if !(settlement.fully_settled && settlement.settled_upto == current_epoch) {
        return Err(LedgerError::LockupNotSettled);
    }
    if amount > account.available() {
        return Err(LedgerError::InsufficientFunds);
    }
    account.funds -= amount;
    Ok(())
}
