//! In-memory token ledger
//!
//! ERC20-style balances split into a spendable and a locked part. Only the
//! movements the staking core needs are exposed; transfers and allowances
//! live outside this crate.

use crate::domain::Address;
use crate::error::{CasperError, CasperResult};
use crate::ports::outbound::TokenLedger;
use crate::types::TokenMetadata;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Balances {
    spendable: HashMap<Address, u128>,
    locked: HashMap<Address, u128>,
    total_supply: u128,
}

impl Balances {
    fn debit(
        map: &mut HashMap<Address, u128>,
        owner: &Address,
        amount: u128,
        what: &str,
    ) -> CasperResult<()> {
        let balance = map.get(owner).copied().unwrap_or(0);
        let remaining = balance.checked_sub(amount).ok_or_else(|| CasperError::Ledger {
            reason: format!("insufficient {what} balance: have {balance}, need {amount}"),
        })?;
        if remaining == 0 {
            map.remove(owner);
        } else {
            map.insert(*owner, remaining);
        }
        Ok(())
    }

    fn credit(map: &mut HashMap<Address, u128>, owner: &Address, amount: u128) {
        let entry = map.entry(*owner).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

/// Token ledger held in memory.
pub struct InMemoryTokenLedger {
    metadata: TokenMetadata,
    balances: RwLock<Balances>,
}

impl InMemoryTokenLedger {
    pub fn new(metadata: TokenMetadata) -> Self {
        Self {
            metadata,
            balances: RwLock::new(Balances::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Create new spendable tokens.
    pub fn mint(&self, owner: &Address, amount: u128) -> CasperResult<()> {
        let mut balances = self.balances.write();
        balances.total_supply = balances.total_supply.checked_add(amount).ok_or_else(|| {
            CasperError::Ledger {
                reason: "total supply overflow".to_string(),
            }
        })?;
        Balances::credit(&mut balances.spendable, owner, amount);
        Ok(())
    }

    /// Spendable balance
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.read().spendable.get(owner).copied().unwrap_or(0)
    }

    /// Locked stake balance
    pub fn locked_of(&self, owner: &Address) -> u128 {
        self.balances.read().locked.get(owner).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.read().total_supply
    }
}

impl Default for InMemoryTokenLedger {
    fn default() -> Self {
        Self::new(TokenMetadata::default())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn lock(&self, owner: &Address, amount: u128) -> CasperResult<()> {
        let mut balances = self.balances.write();
        Balances::debit(&mut balances.spendable, owner, amount, "spendable")?;
        Balances::credit(&mut balances.locked, owner, amount);
        Ok(())
    }

    fn unlock(&self, owner: &Address, amount: u128) -> CasperResult<()> {
        let mut balances = self.balances.write();
        Balances::debit(&mut balances.locked, owner, amount, "locked")?;
        Balances::credit(&mut balances.spendable, owner, amount);
        Ok(())
    }

    fn confiscate_locked(
        &self,
        owner: &Address,
        amount: u128,
        reward: Option<(Address, u128)>,
    ) -> CasperResult<()> {
        let paid = reward.map_or(0, |(_, r)| r);
        let burned = amount.checked_sub(paid).ok_or_else(|| CasperError::Ledger {
            reason: format!("reward {paid} exceeds confiscated {amount}"),
        })?;

        // Debit is the only fallible step left, so nothing moves on failure
        let mut balances = self.balances.write();
        Balances::debit(&mut balances.locked, owner, amount, "locked")?;
        if let Some((beneficiary, paid)) = reward {
            Balances::credit(&mut balances.spendable, &beneficiary, paid);
        }
        balances.total_supply = balances.total_supply.saturating_sub(burned);
        Ok(())
    }
}
