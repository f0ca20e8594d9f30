//! Validator entity
//!
//! A validator is an account that has locked stake. Its voting window is the
//! half-open dynasty interval `[start_dynasty, end_dynasty)`.

use serde::{Deserialize, Serialize};

/// Block hash (32 bytes)
pub type Hash = [u8; 32];

/// Account identity (last 20 bytes of keccak256 of the public key)
pub type Address = [u8; 20];

/// Validator record held by the stake ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub address: Address,
    /// Locked stake (zero once confiscated)
    pub stake: u128,
    /// First dynasty in which the validator may vote
    pub start_dynasty: u64,
    /// Dynasty at which the validator stops voting (None = unset)
    pub end_dynasty: Option<u64>,
    /// Block height of the withdrawal request, if any
    pub withdrawal_requested_at: Option<u64>,
    /// Permanent marker set by confiscation
    pub slashed: bool,
}

impl ValidatorRecord {
    /// Create a record for a fresh deposit
    pub fn new(address: Address, stake: u128, start_dynasty: u64) -> Self {
        Self {
            address,
            stake,
            start_dynasty,
            end_dynasty: None,
            withdrawal_requested_at: None,
            slashed: false,
        }
    }

    /// Whether the validator belongs to the snapshot of `dynasty`
    pub fn is_active_in(&self, dynasty: u64) -> bool {
        !self.slashed
            && self.stake > 0
            && self.start_dynasty <= dynasty
            && self.end_dynasty.map_or(true, |end| dynasty < end)
    }

    /// Whether a withdrawal request is pending
    pub fn has_requested_withdrawal(&self) -> bool {
        self.end_dynasty.is_some() && !self.slashed
    }

    /// Whether the stake can be released at `dynasty`
    pub fn is_withdrawable_at(&self, dynasty: u64) -> bool {
        !self.slashed && self.end_dynasty.is_some_and(|end| dynasty >= end)
    }
}
