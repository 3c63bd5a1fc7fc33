use std::collections::HashMap;

use rail_ledger::{Address, Amount, LedgerError, Result, Token};

/// In-memory stand-in for the host's real token custody. Tracks an external
/// balance per `(token, owner)` so tests can assert fund conservation (I4)
/// across `deposit`/`withdraw` without a real mint.
#[derive(Debug, Default)]
pub struct TestVault {
    external: HashMap<(Token, Address), Amount>,
}

impl TestVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `owner`'s external (pre-deposit) balance, as if minted by a
    /// faucet outside the ledger.
    pub fn fund(&mut self, token: Token, owner: Address, amount: Amount) {
        *self.external.entry((token, owner)).or_default() += amount;
    }

    pub fn external_balance(&self, token: Token, owner: Address) -> Amount {
        self.external.get(&(token, owner)).copied().unwrap_or(0)
    }
}

impl rail_ledger::vault::TokenVault for TestVault {
    fn pull(&mut self, token: Token, from: Address, amount: Amount) -> Result<()> {
        let balance = self.external.entry((token, from)).or_default();
        if *balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        *balance -= amount;
        Ok(())
    }

    fn push(&mut self, token: Token, to: Address, amount: Amount) -> Result<()> {
        *self.external.entry((token, to)).or_default() += amount;
        Ok(())
    }
}
