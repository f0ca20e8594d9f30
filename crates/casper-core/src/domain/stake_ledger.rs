//! # Stake Ledger
//!
//! Locked stake per validator, dynasty window bookkeeping and the slashed
//! marker. No dependency on voting logic.
//!
//! ## Conservation
//!
//! `total_locked() == total_deposited - total_withdrawn - total_confiscated`
//! holds after every operation.
//!
//! Operations that can fail are split into a `check_*` step and the mutating
//! step so the caller can talk to the token ledger in between and keep every
//! call all-or-nothing.

use super::validator::{Address, ValidatorRecord};
use crate::error::{CasperError, CasperResult};
use std::collections::HashMap;

/// Dynasties a new deposit waits before it may vote
pub const DEPOSIT_ACTIVATION_DELAY: u64 = 2;

/// Validator stake bookkeeping.
#[derive(Clone, Debug)]
pub struct StakeLedger {
    validators: HashMap<Address, ValidatorRecord>,
    min_deposit: u128,
    withdrawal_delay: u64,
    total_deposited: u128,
    total_withdrawn: u128,
    total_confiscated: u128,
}

impl StakeLedger {
    pub fn new(min_deposit: u128, withdrawal_delay: u64) -> Self {
        Self {
            validators: HashMap::new(),
            min_deposit,
            withdrawal_delay,
            total_deposited: 0,
            total_withdrawn: 0,
            total_confiscated: 0,
        }
    }

    /// Enroll a validator that is active from dynasty 0.
    pub fn register_genesis(&mut self, address: Address, stake: u128) {
        let record = self
            .validators
            .entry(address)
            .or_insert_with(|| ValidatorRecord::new(address, 0, 0));
        record.stake = record.stake.saturating_add(stake);
        self.total_deposited = self.total_deposited.saturating_add(stake);
    }

    /// Validate a deposit without applying it.
    pub fn check_deposit(&self, address: &Address, amount: u128) -> CasperResult<()> {
        if amount <= self.min_deposit {
            return Err(CasperError::InvalidAmount {
                amount,
                minimum: self.min_deposit,
            });
        }
        if let Some(record) = self.validators.get(address) {
            if record.slashed {
                return Err(CasperError::AlreadySlashed {
                    validator: *address,
                });
            }
            if record.has_requested_withdrawal() {
                return Err(CasperError::AlreadyRequested {
                    validator: *address,
                });
            }
        }
        Ok(())
    }

    /// Lock `amount` for `address`. A new record starts voting two dynasties
    /// after the current one; a top-up keeps its start dynasty.
    pub fn deposit(
        &mut self,
        address: Address,
        amount: u128,
        current_dynasty: u64,
    ) -> CasperResult<&ValidatorRecord> {
        self.check_deposit(&address, amount)?;

        let start_dynasty = current_dynasty.saturating_add(DEPOSIT_ACTIVATION_DELAY);
        let record = self
            .validators
            .entry(address)
            .or_insert_with(|| ValidatorRecord::new(address, 0, start_dynasty));
        record.stake = record.stake.saturating_add(amount);
        self.total_deposited = self.total_deposited.saturating_add(amount);
        Ok(record)
    }

    /// Validate a withdrawal request without applying it.
    pub fn check_request_withdraw(&self, address: &Address) -> CasperResult<&ValidatorRecord> {
        let record = self.get_deposited(address)?;
        if record.has_requested_withdrawal() {
            return Err(CasperError::AlreadyRequested {
                validator: *address,
            });
        }
        Ok(record)
    }

    /// Schedule the end of the validator's window `withdrawal_delay`
    /// dynasties from now. Returns the end dynasty.
    pub fn request_withdraw(
        &mut self,
        address: &Address,
        current_dynasty: u64,
        block_height: u64,
    ) -> CasperResult<u64> {
        self.check_request_withdraw(address)?;

        let end_dynasty = current_dynasty.saturating_add(self.withdrawal_delay);
        if let Some(record) = self.validators.get_mut(address) {
            record.end_dynasty = Some(end_dynasty);
            record.withdrawal_requested_at = Some(block_height);
        }
        Ok(end_dynasty)
    }

    /// Validate a withdrawal without applying it. Returns the releasable
    /// amount.
    pub fn check_withdraw(&self, address: &Address, current_dynasty: u64) -> CasperResult<u128> {
        let record = self
            .validators
            .get(address)
            .ok_or(CasperError::NotDeposited {
                validator: *address,
            })?;
        if record.slashed {
            return Err(CasperError::AlreadySlashed {
                validator: *address,
            });
        }
        if !record.is_withdrawable_at(current_dynasty) {
            return Err(CasperError::NotMatured {
                current: current_dynasty,
                end_dynasty: record.end_dynasty,
            });
        }
        Ok(record.stake)
    }

    /// Release the stake and delete the record. Returns the released amount.
    pub fn withdraw(&mut self, address: &Address, current_dynasty: u64) -> CasperResult<u128> {
        let amount = self.check_withdraw(address, current_dynasty)?;
        self.validators.remove(address);
        self.total_withdrawn = self.total_withdrawn.saturating_add(amount);
        Ok(amount)
    }

    /// Validate a confiscation without applying it. Returns the stake at risk.
    pub fn check_confiscate(&self, address: &Address) -> CasperResult<u128> {
        let record = self
            .validators
            .get(address)
            .ok_or(CasperError::NotDeposited {
                validator: *address,
            })?;
        if record.slashed {
            return Err(CasperError::AlreadySlashed {
                validator: *address,
            });
        }
        Ok(record.stake)
    }

    /// Zero the stake regardless of withdrawal state and mark the record as
    /// slashed for good. Returns the confiscated amount.
    pub fn confiscate(&mut self, address: &Address, current_dynasty: u64) -> CasperResult<u128> {
        let amount = self.check_confiscate(address)?;
        if let Some(record) = self.validators.get_mut(address) {
            let cutoff = current_dynasty.saturating_add(1);
            record.end_dynasty = Some(record.end_dynasty.map_or(cutoff, |end| end.min(cutoff)));
            record.stake = 0;
            record.slashed = true;
        }
        self.total_confiscated = self.total_confiscated.saturating_add(amount);
        Ok(amount)
    }

    /// Get a validator record
    pub fn get(&self, address: &Address) -> Option<&ValidatorRecord> {
        self.validators.get(address)
    }

    /// Iterate over all records
    pub fn iter(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.validators.values()
    }

    /// Sum of all locked stake
    pub fn total_locked(&self) -> u128 {
        self.validators.values().map(|v| v.stake).sum()
    }

    pub fn total_deposited(&self) -> u128 {
        self.total_deposited
    }

    pub fn total_withdrawn(&self) -> u128 {
        self.total_withdrawn
    }

    pub fn total_confiscated(&self) -> u128 {
        self.total_confiscated
    }

    pub fn withdrawal_delay(&self) -> u64 {
        self.withdrawal_delay
    }

    fn get_deposited(&self, address: &Address) -> CasperResult<&ValidatorRecord> {
        let record = self
            .validators
            .get(address)
            .ok_or(CasperError::NotDeposited {
                validator: *address,
            })?;
        if record.slashed {
            return Err(CasperError::AlreadySlashed {
                validator: *address,
            });
        }
        if record.stake == 0 {
            return Err(CasperError::NotDeposited {
                validator: *address,
            });
        }
        Ok(record)
    }
}
