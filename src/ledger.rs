//! Component F: command dispatcher (§4.F, §6).
//!
//! Owns the three logical mappings from §3 (`accounts`, `rails`,
//! `operator_approvals`) plus `client_operator_rails` and `next_rail_id`,
//! and exposes the public command surface. Every command that transfers
//! tokens (`deposit`, `withdraw`, `settle_rail`/`settle_rail_batch`) runs
//! under the process-wide `in_token_op` guard (§5.1); every command that
//! mutates a rail (`create_rail`, `modify_rail_lockup`,
//! `modify_rail_payment`, `terminate_rail`) runs under that rail's
//! `is_locked` flag (§5.2). Each dispatcher method computes on a clone of
//! the affected entities and only writes the clone back on success, so a
//! rejected command never leaves a partial mutation behind — the
//! transactional guarantee of §7 falls out of ordinary value semantics
//! rather than an explicit undo log.

use std::collections::HashMap;

use crate::{
    config::LedgerConfig,
    error::LedgerError,
    lifecycle,
    settlement::{self, Arbiter, ArbiterRegistry, SettlementOutcome},
    state::{Account, OperatorApproval, Rail},
    types::{Address, Amount, Epoch, RailId, Token},
    vault::TokenVault,
    Result,
};

type AccountKey = (Token, Address);
type OperatorKey = (Token, Address, Address);

/// The ledger's full state: accounts, rails, and operator approvals,
/// driven by a host-supplied, monotonically non-decreasing epoch clock.
#[derive(Debug, Clone)]
pub struct Ledger {
    config: LedgerConfig,
    current_epoch: Epoch,
    next_rail_id: RailId,
    accounts: HashMap<AccountKey, Account>,
    rails: HashMap<RailId, Rail>,
    operator_approvals: HashMap<OperatorKey, OperatorApproval>,
    client_operator_rails: HashMap<(Address, Address), Vec<RailId>>,
    in_token_op: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            current_epoch: 0,
            next_rail_id: 1,
            accounts: HashMap::new(),
            rails: HashMap::new(),
            operator_approvals: HashMap::new(),
            client_operator_rails: HashMap::new(),
            in_token_op: false,
        }
    }

    pub fn current_epoch(&self) -> Epoch {
        self.current_epoch
    }

    /// Advances the host-supplied clock. The host is trusted to supply a
    /// monotonically non-decreasing sequence; a regression is rejected
    /// rather than silently accepted.
    pub fn advance_epoch(&mut self, epoch: Epoch) -> Result<()> {
        if epoch < self.current_epoch {
            return Err(LedgerError::InvariantBroken);
        }
        self.current_epoch = epoch;
        Ok(())
    }

    pub fn get_account(&self, token: Token, owner: Address) -> Option<&Account> {
        self.accounts.get(&(token, owner))
    }

    pub fn get_rail(&self, rail_id: RailId) -> Option<&Rail> {
        self.rails.get(&rail_id)
    }

    pub fn get_operator_approval(
        &self,
        token: Token,
        payer: Address,
        operator: Address,
    ) -> Option<&OperatorApproval> {
        self.operator_approvals.get(&(token, payer, operator))
    }

    pub fn client_operator_rails(&self, payer: Address, operator: Address) -> &[RailId] {
        self.client_operator_rails
            .get(&(payer, operator))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn begin_token_op(&mut self) -> Result<()> {
        if self.in_token_op {
            return Err(LedgerError::ConcurrentModification);
        }
        self.in_token_op = true;
        Ok(())
    }

    fn end_token_op(&mut self) {
        self.in_token_op = false;
    }

    /// `approve_operator(token, operator, rate_allowance, lockup_allowance)`,
    /// caller = payer.
    pub fn approve_operator(
        &mut self,
        token: Token,
        operator: Address,
        rate_allowance: Amount,
        lockup_allowance: Amount,
        caller: Address,
    ) {
        self.set_operator_approval(token, operator, true, rate_allowance, lockup_allowance, caller);
    }

    /// `set_operator_approval(token, operator, approved, rate_allowance, lockup_allowance)`,
    /// caller = payer.
    pub fn set_operator_approval(
        &mut self,
        token: Token,
        operator: Address,
        approved: bool,
        rate_allowance: Amount,
        lockup_allowance: Amount,
        caller: Address,
    ) {
        let approval = self.operator_approvals.entry((token, caller, operator)).or_default();
        approval.is_approved = approved;
        approval.rate_allowance = rate_allowance;
        approval.lockup_allowance = lockup_allowance;
        log::debug!("operator approval set: approved={approved} rate={rate_allowance} lockup={lockup_allowance}");
    }

    /// `terminate_operator(operator, token)`, caller = payer.
    pub fn terminate_operator(&mut self, token: Token, operator: Address, caller: Address) -> Result<()> {
        let approval = self
            .operator_approvals
            .get_mut(&(token, caller, operator))
            .ok_or(LedgerError::EntityMissing)?;
        approval.terminate();
        log::debug!("operator approval terminated");
        Ok(())
    }

    /// `deposit(token, to, amount)`. Pulls `amount` from `caller` via
    /// `vault`, credits `to`, then folds any deferred lockup into
    /// `to`'s account.
    pub fn deposit(
        &mut self,
        token: Token,
        to: Address,
        amount: Amount,
        caller: Address,
        vault: &mut dyn TokenVault,
    ) -> Result<()> {
        self.begin_token_op()?;
        let result = self.deposit_inner(token, to, amount, caller, vault);
        self.end_token_op();
        result
    }

    fn deposit_inner(
        &mut self,
        token: Token,
        to: Address,
        amount: Amount,
        caller: Address,
        vault: &mut dyn TokenVault,
    ) -> Result<()> {
        vault.pull(token, caller, amount)?;
        let epoch = self.current_epoch;
        let mut account = self.accounts.get(&(token, to)).copied().unwrap_or_default();
        lifecycle::deposit(&mut account, amount, epoch)?;
        self.accounts.insert((token, to), account);
        log::debug!("deposited {amount}");
        Ok(())
    }

    /// `withdraw(token, amount)`, caller = account owner.
    pub fn withdraw(
        &mut self,
        token: Token,
        amount: Amount,
        caller: Address,
        vault: &mut dyn TokenVault,
    ) -> Result<()> {
        self.withdraw_to(token, caller, amount, vault, caller)
    }

    /// `withdraw_to(token, to, amount)`, caller = account owner.
    pub fn withdraw_to(
        &mut self,
        token: Token,
        to: Address,
        amount: Amount,
        vault: &mut dyn TokenVault,
        caller: Address,
    ) -> Result<()> {
        self.begin_token_op()?;
        let result = self.withdraw_inner(token, to, amount, vault, caller);
        self.end_token_op();
        result
    }

    fn withdraw_inner(
        &mut self,
        token: Token,
        to: Address,
        amount: Amount,
        vault: &mut dyn TokenVault,
        caller: Address,
    ) -> Result<()> {
        let mut account = self
            .accounts
            .get(&(token, caller))
            .copied()
            .ok_or(LedgerError::EntityMissing)?;
        let epoch = self.current_epoch;
        lifecycle::withdraw(&mut account, amount, epoch)?;
        vault.push(token, to, amount)?;
        self.accounts.insert((token, caller), account);
        log::debug!("withdrew {amount}");
        Ok(())
    }

    /// `create_rail(token, from, to, arbiter)`, operator = `caller`.
    /// `from` and `to` must differ: a rail paying its own payer is not a
    /// meaningful commitment and the ledger cannot represent one (the
    /// payer and payee accounts must be independently addressable).
    pub fn create_rail(
        &mut self,
        token: Token,
        from: Address,
        to: Address,
        arbiter: Option<Address>,
        caller: Address,
    ) -> Result<RailId> {
        if from == to {
            return Err(LedgerError::InvariantBroken);
        }
        let approval = self
            .operator_approvals
            .get(&(token, from, caller))
            .copied()
            .unwrap_or_default();
        let from_account = self.accounts.get(&(token, from)).copied().unwrap_or_default();
        let to_account = self.accounts.get(&(token, to)).copied().unwrap_or_default();
        let epoch = self.current_epoch;

        let rail = lifecycle::create_rail(
            token,
            from,
            to,
            caller,
            arbiter,
            &approval,
            &from_account,
            &to_account,
            epoch,
            &self.config,
        )?;

        let rail_id = self.next_rail_id;
        self.next_rail_id = self.next_rail_id.checked_add(1).ok_or(LedgerError::Arithmetic)?;
        self.rails.insert(rail_id, rail);
        self.client_operator_rails.entry((from, caller)).or_default().push(rail_id);
        log::debug!("rail {rail_id} created");
        Ok(rail_id)
    }

    /// `modify_rail_lockup(rail_id, period, fixed)`, operator-only.
    pub fn modify_rail_lockup(
        &mut self,
        rail_id: RailId,
        new_period: Epoch,
        new_fixed: Amount,
        caller: Address,
    ) -> Result<()> {
        let epoch = self.current_epoch;
        let Ledger { rails, accounts, operator_approvals, .. } = self;

        let rail = rails.get_mut(&rail_id).ok_or(LedgerError::EntityMissing)?;
        if rail.is_locked {
            return Err(LedgerError::ConcurrentModification);
        }
        rail.is_locked = true;

        let token = rail.token;
        let from = rail.from;
        let operator = rail.operator;
        let mut rail_clone = rail.clone();
        let mut payer = accounts.get(&(token, from)).copied().unwrap_or_default();
        let mut approval = operator_approvals
            .get(&(token, from, operator))
            .copied()
            .unwrap_or_default();

        let result = lifecycle::modify_rail_lockup(
            &mut rail_clone,
            &mut payer,
            &mut approval,
            caller,
            new_period,
            new_fixed,
            epoch,
        );

        rail.is_locked = false;
        if result.is_ok() {
            rail_clone.is_locked = false;
            *rail = rail_clone;
            accounts.insert((token, from), payer);
            operator_approvals.insert((token, from, operator), approval);
        }
        result
    }

    /// `modify_rail_payment(rail_id, new_rate, one_time_payment)`, operator-only.
    pub fn modify_rail_payment(
        &mut self,
        rail_id: RailId,
        new_rate: Amount,
        one_time_payment: Amount,
        caller: Address,
    ) -> Result<()> {
        let epoch = self.current_epoch;
        let Ledger { rails, accounts, operator_approvals, .. } = self;

        let rail = rails.get_mut(&rail_id).ok_or(LedgerError::EntityMissing)?;
        if rail.is_locked {
            return Err(LedgerError::ConcurrentModification);
        }
        rail.is_locked = true;

        let token = rail.token;
        let from = rail.from;
        let to = rail.to;
        let operator = rail.operator;
        let mut rail_clone = rail.clone();
        let mut payer = accounts.get(&(token, from)).copied().unwrap_or_default();
        let mut payee = accounts.get(&(token, to)).copied().unwrap_or_default();
        let mut approval = operator_approvals
            .get(&(token, from, operator))
            .copied()
            .unwrap_or_default();

        let result = lifecycle::modify_rail_payment(
            rail_id,
            &mut rail_clone,
            &mut payer,
            &mut payee,
            &mut approval,
            caller,
            new_rate,
            one_time_payment,
            epoch,
        );

        rail.is_locked = false;
        if result.is_ok() {
            rail_clone.is_locked = false;
            *rail = rail_clone;
            accounts.insert((token, from), payer);
            accounts.insert((token, to), payee);
            operator_approvals.insert((token, from, operator), approval);
        }
        result
    }

    /// `terminate_rail(rail_id)`, callable by payer, operator, or payee.
    pub fn terminate_rail(&mut self, rail_id: RailId, caller: Address) -> Result<()> {
        let epoch = self.current_epoch;
        let Ledger { rails, accounts, .. } = self;

        let rail = rails.get_mut(&rail_id).ok_or(LedgerError::EntityMissing)?;
        if rail.is_locked {
            return Err(LedgerError::ConcurrentModification);
        }
        rail.is_locked = true;

        let token = rail.token;
        let from = rail.from;
        let mut rail_clone = rail.clone();
        let mut payer = accounts.get(&(token, from)).copied().unwrap_or_default();

        let result = lifecycle::terminate_rail(&mut rail_clone, &mut payer, caller, epoch);

        rail.is_locked = false;
        if result.is_ok() {
            rail_clone.is_locked = false;
            *rail = rail_clone;
            accounts.insert((token, from), payer);
        }
        result
    }

    /// `settle_rail(rail_id, until_epoch, skip_arbitration)`.
    pub fn settle_rail(
        &mut self,
        rail_id: RailId,
        until_epoch: Epoch,
        skip_arbitration: bool,
        arbiter: Option<&mut dyn Arbiter>,
    ) -> Result<SettlementOutcome> {
        self.begin_token_op()?;
        let result = self.settle_rail_inner(rail_id, until_epoch, skip_arbitration, arbiter);
        self.end_token_op();
        result
    }

    fn settle_rail_inner(
        &mut self,
        rail_id: RailId,
        until_epoch: Epoch,
        skip_arbitration: bool,
        arbiter: Option<&mut dyn Arbiter>,
    ) -> Result<SettlementOutcome> {
        let (outcome, rail_clone, payer_key, payer, payee_key, payee) =
            self.settle_rail_uncommitted(rail_id, until_epoch, skip_arbitration, arbiter)?;

        let rail = self.rails.get_mut(&rail_id).ok_or(LedgerError::EntityMissing)?;
        *rail = rail_clone;
        self.accounts.insert(payer_key, payer);
        self.accounts.insert(payee_key, payee);
        Ok(outcome)
    }

    /// Computes a rail's settlement without writing anything back, so a
    /// caller (namely [`Ledger::settle_rail_batch`]) can buffer several of
    /// these and commit them all together, or none at all.
    #[allow(clippy::type_complexity)]
    fn settle_rail_uncommitted(
        &self,
        rail_id: RailId,
        until_epoch: Epoch,
        skip_arbitration: bool,
        arbiter: Option<&mut dyn Arbiter>,
    ) -> Result<(SettlementOutcome, Rail, AccountKey, Account, AccountKey, Account)> {
        let epoch = self.current_epoch;
        let rail = self.rails.get(&rail_id).ok_or(LedgerError::EntityMissing)?;
        let token = rail.token;
        let from = rail.from;
        let to = rail.to;
        let mut rail_clone = rail.clone();
        let mut payer = self.accounts.get(&(token, from)).copied().unwrap_or_default();
        let mut payee = self.accounts.get(&(token, to)).copied().unwrap_or_default();

        let outcome = settlement::settle_rail(
            rail_id,
            &mut rail_clone,
            &mut payer,
            &mut payee,
            epoch,
            until_epoch,
            skip_arbitration,
            arbiter,
        )?;

        Ok((outcome, rail_clone, (token, from), payer, (token, to), payee))
    }

    /// `settle_rail_batch(ids[])`: settles each id in order with
    /// `until_epoch = current_epoch, skip_arbitration = false`. The whole
    /// batch is one transactional command (§7): a failure on any id aborts
    /// the batch and leaves every rail/account untouched, including ids
    /// that settled successfully earlier in the same call.
    pub fn settle_rail_batch(
        &mut self,
        rail_ids: &[RailId],
        registry: &mut dyn ArbiterRegistry,
    ) -> Result<Vec<SettlementOutcome>> {
        self.begin_token_op()?;
        let epoch = self.current_epoch;
        let mut outcomes = Vec::with_capacity(rail_ids.len());
        let mut pending_rails = Vec::with_capacity(rail_ids.len());
        let mut pending_accounts: HashMap<AccountKey, Account> = HashMap::new();

        for &rail_id in rail_ids {
            let arbiter = registry.arbiter_for(rail_id);
            match self.settle_rail_uncommitted(rail_id, epoch, false, arbiter) {
                Ok((outcome, rail_clone, payer_key, payer, payee_key, payee)) => {
                    outcomes.push(outcome);
                    pending_rails.push((rail_id, rail_clone));
                    pending_accounts.insert(payer_key, payer);
                    pending_accounts.insert(payee_key, payee);
                }
                Err(err) => {
                    self.end_token_op();
                    return Err(err);
                }
            }
        }

        for (rail_id, rail_clone) in pending_rails {
            self.rails.insert(rail_id, rail_clone);
        }
        self.accounts.extend(pending_accounts);

        self.end_token_op();
        Ok(outcomes)
    }
}
