//! # Dynasty Manager
//!
//! Keeps the current dynasty counter and an arena of frozen validator
//! snapshots indexed by dynasty number.
//!
//! A snapshot is computed once, when its dynasty becomes current, and never
//! mutated afterwards. Vote tallies always weigh stake against these frozen
//! snapshots, so deposits, withdrawals or slashes recorded mid-dynasty cannot
//! move an in-flight tally.

use super::stake_ledger::StakeLedger;
use super::validator::Address;
use std::collections::HashMap;

/// Snapshot entry for one validator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub stake: u128,
    /// Position in the participation bitmap
    pub index: usize,
}

/// Frozen validator set for a dynasty
#[derive(Clone, Debug, Default)]
pub struct DynastySnapshot {
    dynasty: u64,
    validators: HashMap<Address, SnapshotEntry>,
    index_to_address: Vec<Address>,
    total_stake: u128,
}

impl DynastySnapshot {
    /// Freeze the validators active in `dynasty`.
    pub fn freeze(dynasty: u64, ledger: &StakeLedger) -> Self {
        let mut active: Vec<(Address, u128)> = ledger
            .iter()
            .filter(|record| record.is_active_in(dynasty))
            .map(|record| (record.address, record.stake))
            .collect();
        // Deterministic bitmap positions
        active.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut snapshot = Self {
            dynasty,
            ..Self::default()
        };
        for (address, stake) in active {
            let index = snapshot.index_to_address.len();
            snapshot
                .validators
                .insert(address, SnapshotEntry { stake, index });
            snapshot.index_to_address.push(address);
            snapshot.total_stake = snapshot.total_stake.saturating_add(stake);
        }
        snapshot
    }

    pub fn dynasty(&self) -> u64 {
        self.dynasty
    }

    /// Get a validator's entry
    pub fn get(&self, address: &Address) -> Option<&SnapshotEntry> {
        self.validators.get(address)
    }

    /// Get a validator's frozen stake
    pub fn get_stake(&self, address: &Address) -> Option<u128> {
        self.validators.get(address).map(|e| e.stake)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.validators.contains_key(address)
    }

    /// Total active stake
    pub fn total_stake(&self) -> u128 {
        self.total_stake
    }

    pub fn len(&self) -> usize {
        self.index_to_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_address.is_empty()
    }

    /// Iterate over active addresses in bitmap order
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.index_to_address.iter()
    }
}

/// Dynasty counter plus the snapshot arena.
#[derive(Clone, Debug)]
pub struct DynastyManager {
    current: u64,
    snapshots: Vec<DynastySnapshot>,
}

impl DynastyManager {
    /// Start at dynasty 0 with the genesis validator set frozen.
    pub fn genesis(ledger: &StakeLedger) -> Self {
        Self {
            current: 0,
            snapshots: vec![DynastySnapshot::freeze(0, ledger)],
        }
    }

    /// Current dynasty number
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Snapshot for the current dynasty
    pub fn current_snapshot(&self) -> &DynastySnapshot {
        // The arena always holds the current dynasty
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Snapshot for any dynasty reached so far
    pub fn snapshot(&self, dynasty: u64) -> Option<&DynastySnapshot> {
        usize::try_from(dynasty)
            .ok()
            .and_then(|i| self.snapshots.get(i))
    }

    /// Dynasties whose validators may have a vote counted right now: the
    /// current one and, past genesis, the previous one.
    pub fn voting_dynasties(&self) -> impl Iterator<Item = &DynastySnapshot> {
        let start = self.snapshots.len().saturating_sub(2);
        self.snapshots[start..].iter().rev()
    }

    /// Whether `address` is active in any voting dynasty
    pub fn is_voting_validator(&self, address: &Address) -> bool {
        self.voting_dynasties().any(|s| s.contains(address))
    }

    /// Move to the next dynasty and freeze its validator set.
    ///
    /// Called only by the finality gadget when a checkpoint is finalized.
    pub fn advance(&mut self, ledger: &StakeLedger) -> u64 {
        self.current += 1;
        let snapshot = DynastySnapshot::freeze(self.current, ledger);
        tracing::info!(
            "[casper] Dynasty {} begins: {} validators, {} total stake",
            self.current,
            snapshot.len(),
            snapshot.total_stake()
        );
        self.snapshots.push(snapshot);
        self.current
    }
}
