//! Component D: rail settlement engine (§4.D).

use crate::{
    error::LedgerError,
    state::{Account, Rail},
    types::{Amount, Epoch, RailId},
    Result,
};

/// A single arbitration decision returned by a rail's [`Arbiter`].
///
/// `from_epoch <= settle_upto <= to_epoch` and
/// `modified_amount <= rate * (settle_upto - from_epoch)` are required of
/// every decision; the engine treats the arbiter as untrusted and rejects
/// the whole command with [`LedgerError::ArbiterContractViolation`] if
/// either bound is violated.
#[derive(Debug, Clone)]
pub struct ArbiterDecision {
    pub modified_amount: Amount,
    pub settle_upto: Epoch,
    pub note: String,
}

/// External collaborator consulted during settlement to potentially reduce
/// the amount or range being settled (§1, §6). The engine never
/// constructs one; the host supplies a `&mut dyn Arbiter` for each
/// settlement call on a rail that has one configured.
pub trait Arbiter {
    fn arbitrate(
        &mut self,
        rail_id: RailId,
        proposed_amount: Amount,
        from_epoch: Epoch,
        to_epoch: Epoch,
    ) -> ArbiterDecision;
}

/// Looks up the arbiter for a rail during a batch settlement, where the
/// caller cannot know ahead of time which rails need which arbiter.
pub trait ArbiterRegistry {
    fn arbiter_for(&mut self, rail_id: RailId) -> Option<&mut dyn Arbiter>;
}

/// Stable note describing why a [`SettlementOutcome`] stopped where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementNote {
    /// The rail is inactive; no mutation occurred.
    Inactive,
    /// Settlement reached the termination boundary and finalized the rail.
    Finalized,
    /// `settled_up_to` was already at or past the computed target.
    AlreadySettled,
    /// The rail (or its current segment) has a zero rate.
    ZeroRate,
    /// Normal progress, possibly partial (arbiter-limited or debt-limited).
    Settled,
}

impl core::fmt::Display for SettlementNote {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SettlementNote::Inactive => "inactive",
            SettlementNote::Finalized => "finalized",
            SettlementNote::AlreadySettled => "already settled",
            SettlementNote::ZeroRate => "zero-rate",
            SettlementNote::Settled => "settled",
        };
        f.write_str(s)
    }
}

/// Result of a `settle_rail` call: total funds moved, the epoch settlement
/// reached, and why it stopped there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub total_settled: Amount,
    pub final_epoch: Epoch,
    pub note: SettlementNote,
}

/// Reborrows an `Option<&mut dyn Arbiter>` with a lifetime scoped to the
/// call, so a loop can hand it to [`settle_segment`] once per iteration
/// without the arbiter's own lifetime pinning every iteration together.
fn reborrow<'a>(arbiter: &'a mut Option<&mut dyn Arbiter>) -> Option<&'a mut dyn Arbiter> {
    match arbiter {
        Some(a) => Some(&mut **a),
        None => None,
    }
}

/// Advances `rail.settled_up_to` through zero or more historical rate
/// segments, optionally consulting an arbiter, and transfers funds from
/// `payer` to `payee` as each segment clears.
///
/// `lockup_settled_upto` and `lockup_period_ceiling` are taken from a
/// prior call to [`crate::lockup::settle_account_lockup`] on `payer`
/// (§4.D requires this to happen exactly once per call, before the
/// effective ceiling is computed).
#[allow(clippy::too_many_arguments)]
pub fn settle_rail(
    rail_id: RailId,
    rail: &mut Rail,
    payer: &mut Account,
    payee: &mut Account,
    current_epoch: Epoch,
    until_epoch: Epoch,
    skip_arbitration: bool,
    mut arbiter: Option<&mut dyn Arbiter>,
) -> Result<SettlementOutcome> {
    if until_epoch > current_epoch {
        return Err(LedgerError::InvariantBroken);
    }

    if !rail.is_active {
        return Ok(SettlementOutcome {
            total_settled: 0,
            final_epoch: rail.settled_up_to,
            note: SettlementNote::Inactive,
        });
    }

    let mut until_epoch = until_epoch;
    if let Some(max_term) = rail.max_settlement_epoch() {
        if rail.settled_up_to >= max_term {
            finalize(rail, payer)?;
            return Ok(SettlementOutcome {
                total_settled: 0,
                final_epoch: rail.settled_up_to,
                note: SettlementNote::Finalized,
            });
        }
        until_epoch = until_epoch.min(max_term);
    }

    let settlement = crate::lockup::settle_account_lockup(payer, current_epoch);

    let mut target = until_epoch.min(payer.lockup_last_settled_at + rail.lockup_period);
    let _ = settlement; // consulted only for its effect on `payer`, per §4.D
    if let Some(max_term) = rail.max_settlement_epoch() {
        target = target.min(max_term);
    }

    if rail.settled_up_to >= target {
        return Ok(SettlementOutcome {
            total_settled: 0,
            final_epoch: rail.settled_up_to,
            note: SettlementNote::AlreadySettled,
        });
    }

    if rail.payment_rate == 0 && rail.rate_change_queue.is_empty() {
        rail.settled_up_to = target;
        return Ok(SettlementOutcome {
            total_settled: 0,
            final_epoch: target,
            note: SettlementNote::ZeroRate,
        });
    }

    let mut processed = rail.settled_up_to;
    let mut total: Amount = 0;

    loop {
        if processed == target {
            break;
        }

        let head = rail.rate_change_queue.peek().copied();
        let (segment_end, segment_rate, consumes_head) = match head {
            Some(next) => {
                if next.until_epoch < processed {
                    return Err(LedgerError::InvariantBroken);
                }
                (target.min(next.until_epoch), next.rate, true)
            }
            None => {
                if rail.payment_rate == 0 {
                    rail.settled_up_to = target;
                    return Ok(SettlementOutcome {
                        total_settled: total,
                        final_epoch: target,
                        note: SettlementNote::ZeroRate,
                    });
                }
                (target, rail.payment_rate, false)
            }
        };

        let (settle_upto, modified_amount) = settle_segment(
            rail_id,
            rail,
            payer,
            payee,
            processed,
            segment_end,
            segment_rate,
            skip_arbitration,
            reborrow(&mut arbiter),
        )?;
        total += modified_amount;

        if settle_upto == processed {
            if segment_end == processed {
                // The segment was zero-width to begin with (a queued
                // boundary coinciding with `processed`), not an
                // arbiter-imposed stall: consume it and keep going.
                if consumes_head {
                    rail.rate_change_queue.dequeue();
                }
                continue;
            }
            return Ok(SettlementOutcome {
                total_settled: total,
                final_epoch: processed,
                note: SettlementNote::Settled,
            });
        }

        if settle_upto < segment_end {
            return Ok(SettlementOutcome {
                total_settled: total,
                final_epoch: settle_upto,
                note: SettlementNote::Settled,
            });
        }

        if consumes_head {
            rail.rate_change_queue.dequeue();
        }
        processed = settle_upto;
    }

    Ok(SettlementOutcome {
        total_settled: total,
        final_epoch: processed,
        note: SettlementNote::Settled,
    })
}

fn finalize(rail: &mut Rail, payer: &mut Account) -> Result<()> {
    payer.lockup_current = payer
        .lockup_current
        .checked_sub(rail.lockup_fixed)
        .ok_or(LedgerError::InvariantBroken)?;
    rail.lockup_fixed = 0;
    rail.payment_rate = 0;
    rail.is_active = false;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn settle_segment(
    rail_id: RailId,
    rail: &mut Rail,
    payer: &mut Account,
    payee: &mut Account,
    processed: Epoch,
    segment_end: Epoch,
    segment_rate: Amount,
    skip_arbitration: bool,
    arbiter: Option<&mut dyn Arbiter>,
) -> Result<(Epoch, Amount)> {
    let duration = segment_end - processed;
    let proposed_amount = segment_rate
        .checked_mul(duration as u128)
        .ok_or(LedgerError::Arithmetic)?;

    let (settle_upto, modified_amount) = if rail.arbiter.is_some() && !skip_arbitration {
        let arbiter = arbiter.ok_or(LedgerError::ArbiterContractViolation)?;
        let decision = arbiter.arbitrate(rail_id, proposed_amount, processed, segment_end);

        if decision.settle_upto < processed || decision.settle_upto > segment_end {
            return Err(LedgerError::ArbiterContractViolation);
        }
        let max_allowed = segment_rate
            .checked_mul((decision.settle_upto - processed) as u128)
            .ok_or(LedgerError::Arithmetic)?;
        if decision.modified_amount > max_allowed {
            return Err(LedgerError::ArbiterContractViolation);
        }
        (decision.settle_upto, decision.modified_amount)
    } else {
        (segment_end, proposed_amount)
    };

    if payer.funds < modified_amount || payer.lockup_current < modified_amount {
        return Err(LedgerError::InsufficientFunds);
    }
    payer.funds -= modified_amount;
    payee.funds += modified_amount;
    payer.lockup_current -= modified_amount;
    rail.settled_up_to = settle_upto;

    log::debug!(
        "rail settled: processed={processed} settle_upto={settle_upto} amount={modified_amount}"
    );

    Ok((settle_upto, modified_amount))
}
