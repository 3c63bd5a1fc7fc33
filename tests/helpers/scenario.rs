use rail_ledger::settlement::{Arbiter, ArbiterRegistry, SettlementOutcome};
use rail_ledger::state::{Account, OperatorApproval, Rail};
use rail_ledger::{Address, Amount, Epoch, LedgerConfig, RailId, Result, Token};

use super::vault::TestVault;

/// Thin wrapper around [`rail_ledger::Ledger`] plus a [`TestVault`], the way
/// the teacher lineage's `StakeTestContext` bundles a `Mollusk`/account set.
/// Exists so test bodies read as a sequence of commands rather than plumbing.
pub struct Scenario {
    pub ledger: rail_ledger::Ledger,
    pub vault: TestVault,
    pub token: Token,
}

impl Scenario {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self { ledger: rail_ledger::Ledger::new(config), vault: TestVault::new(), token: Address::new_unique() }
    }

    pub fn advance_epoch(&mut self, epoch: Epoch) {
        self.ledger.advance_epoch(epoch).unwrap();
    }

    pub fn epoch(&self) -> Epoch {
        self.ledger.current_epoch()
    }

    /// Funds `owner`'s external balance and deposits it all into the ledger.
    pub fn deposit(&mut self, owner: Address, amount: Amount) -> Result<()> {
        self.vault.fund(self.token, owner, amount);
        self.ledger.deposit(self.token, owner, amount, owner, &mut self.vault)
    }

    pub fn withdraw(&mut self, owner: Address, amount: Amount) -> Result<()> {
        self.ledger.withdraw(self.token, amount, owner, &mut self.vault)
    }

    pub fn approve_operator(
        &mut self,
        payer: Address,
        operator: Address,
        rate_allowance: Amount,
        lockup_allowance: Amount,
    ) {
        self.ledger.approve_operator(self.token, operator, rate_allowance, lockup_allowance, payer);
    }

    pub fn create_rail(&mut self, operator: Address, from: Address, to: Address) -> Result<RailId> {
        self.ledger.create_rail(self.token, from, to, None, operator)
    }

    pub fn create_rail_with_arbiter(
        &mut self,
        operator: Address,
        from: Address,
        to: Address,
        arbiter: Address,
    ) -> Result<RailId> {
        self.ledger.create_rail(self.token, from, to, Some(arbiter), operator)
    }

    pub fn modify_rail_lockup(
        &mut self,
        rail_id: RailId,
        operator: Address,
        period: Epoch,
        fixed: Amount,
    ) -> Result<()> {
        self.ledger.modify_rail_lockup(rail_id, period, fixed, operator)
    }

    pub fn modify_rail_payment(
        &mut self,
        rail_id: RailId,
        operator: Address,
        new_rate: Amount,
        one_time_payment: Amount,
    ) -> Result<()> {
        self.ledger.modify_rail_payment(rail_id, new_rate, one_time_payment, operator)
    }

    pub fn terminate_rail(&mut self, rail_id: RailId, caller: Address) -> Result<()> {
        self.ledger.terminate_rail(rail_id, caller)
    }

    pub fn settle_rail(&mut self, rail_id: RailId, until_epoch: Epoch) -> Result<SettlementOutcome> {
        self.ledger.settle_rail(rail_id, until_epoch, false, None)
    }

    pub fn settle_rail_with(
        &mut self,
        rail_id: RailId,
        until_epoch: Epoch,
        arbiter: &mut dyn Arbiter,
    ) -> Result<SettlementOutcome> {
        self.ledger.settle_rail(rail_id, until_epoch, false, Some(arbiter))
    }

    pub fn settle_rail_batch(
        &mut self,
        rail_ids: &[RailId],
        registry: &mut dyn ArbiterRegistry,
    ) -> Result<Vec<SettlementOutcome>> {
        self.ledger.settle_rail_batch(rail_ids, registry)
    }

    pub fn account(&self, owner: Address) -> Account {
        self.ledger.get_account(self.token, owner).copied().unwrap_or_default()
    }

    pub fn rail(&self, rail_id: RailId) -> Rail {
        self.ledger.get_rail(rail_id).cloned().unwrap()
    }

    pub fn approval(&self, payer: Address, operator: Address) -> OperatorApproval {
        self.ledger.get_operator_approval(self.token, payer, operator).copied().unwrap_or_default()
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}
