use rail_ledger::settlement::{Arbiter, ArbiterDecision, ArbiterRegistry};
use rail_ledger::{Amount, Epoch, RailId};

/// Arbitrates every segment at face value: full proposed amount, full
/// requested range. Used where the queue/segment math itself is under
/// test, not arbitration.
#[derive(Debug, Default)]
pub struct IdentityArbiter;

impl Arbiter for IdentityArbiter {
    fn arbitrate(
        &mut self,
        _rail_id: RailId,
        proposed_amount: Amount,
        _from_epoch: Epoch,
        to_epoch: Epoch,
    ) -> ArbiterDecision {
        ArbiterDecision { modified_amount: proposed_amount, settle_upto: to_epoch, note: String::new() }
    }
}

/// Always halves the proposed amount while still settling the full range,
/// modeling an arbiter that disputes value but not time (spec §8 scenario 3).
#[derive(Debug, Default)]
pub struct SaturatingArbiter;

impl Arbiter for SaturatingArbiter {
    fn arbitrate(
        &mut self,
        _rail_id: RailId,
        proposed_amount: Amount,
        _from_epoch: Epoch,
        to_epoch: Epoch,
    ) -> ArbiterDecision {
        ArbiterDecision { modified_amount: proposed_amount / 2, settle_upto: to_epoch, note: "halved".into() }
    }
}

/// Minimal [`ArbiterRegistry`] binding a single rail id to one arbiter, for
/// `settle_rail_batch` tests that only exercise one arbitered rail at a time.
pub struct SingleRailRegistry<'a, A: Arbiter> {
    rail_id: RailId,
    arbiter: &'a mut A,
}

impl<'a, A: Arbiter> SingleRailRegistry<'a, A> {
    pub fn new(rail_id: RailId, arbiter: &'a mut A) -> Self {
        Self { rail_id, arbiter }
    }
}

impl<'a, A: Arbiter> ArbiterRegistry for SingleRailRegistry<'a, A> {
    fn arbiter_for(&mut self, rail_id: RailId) -> Option<&mut dyn Arbiter> {
        if rail_id == self.rail_id {
            Some(self.arbiter)
        } else {
            None
        }
    }
}

/// Registry for batches with no arbitered rails.
#[derive(Debug, Default)]
pub struct NoArbiterRegistry;

impl ArbiterRegistry for NoArbiterRegistry {
    fn arbiter_for(&mut self, _rail_id: RailId) -> Option<&mut dyn Arbiter> {
        None
    }
}
