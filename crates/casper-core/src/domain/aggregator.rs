//! # Epoch Vote Aggregator
//!
//! Stake-weighted tallies per (target checkpoint, dynasty).
//!
//! A vote is counted once in every voting dynasty in which its validator is
//! active: around a dynasty transition the same vote adds the validator's
//! frozen stake to both the current and the previous dynasty's tally. The
//! aggregator never decides justification; it reports tallies and the
//! finality gadget applies the quorum.

use super::checkpoint::CheckpointIndex;
use super::dynasty::DynastyManager;
use super::validator::Address;
use crate::error::{CasperError, CasperResult};
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supermajority fraction `numerator / denominator`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quorum {
    pub numerator: u64,
    pub denominator: u64,
}

impl Quorum {
    /// Two thirds of active stake
    pub const TWO_THIRDS: Quorum = Quorum {
        numerator: 2,
        denominator: 3,
    };

    /// Whether `weight` is at least the quorum fraction of `total`.
    ///
    /// A zero total never reaches quorum.
    pub fn is_reached(&self, weight: u128, total: u128) -> bool {
        if total == 0 {
            return false;
        }
        let num = u128::from(self.numerator);
        let den = u128::from(self.denominator);
        match (weight.checked_mul(den), total.checked_mul(num)) {
            (Some(lhs), Some(rhs)) => lhs >= rhs,
            // Large stakes: compare in quotient/remainder form
            _ => {
                let required = (total / den).saturating_mul(num)
                    + ((total % den) * num).div_ceil(den);
                weight >= required
            }
        }
    }
}

impl Default for Quorum {
    fn default() -> Self {
        Self::TWO_THIRDS
    }
}

/// Running tally for one (target, dynasty)
#[derive(Clone, Debug)]
pub struct VoteTally {
    /// Which snapshot validators have been counted
    pub participation: BitVec<u8, Msb0>,
    /// Stake counted so far
    pub stake: u128,
}

impl VoteTally {
    pub fn new(validator_count: usize) -> Self {
        Self {
            participation: bitvec![u8, Msb0; 0; validator_count],
            stake: 0,
        }
    }

    /// Count participating validators
    pub fn participation_count(&self) -> usize {
        self.participation.count_ones()
    }

    /// Check if a validator has been counted
    pub fn has_voted(&self, index: usize) -> bool {
        self.participation.get(index).map(|b| *b).unwrap_or(false)
    }

    fn add(&mut self, index: usize, stake: u128) {
        if index < self.participation.len() {
            self.participation.set(index, true);
        }
        self.stake = self.stake.saturating_add(stake);
    }
}

/// Weight of a target in one dynasty after a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynastyTally {
    pub dynasty: u64,
    pub weight: u128,
    pub total: u128,
}

/// Tallies touched by one submission, current dynasty first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TallyUpdate {
    pub target: CheckpointIndex,
    pub tallies: Vec<DynastyTally>,
}

/// Collects votes into per-dynasty tallies
#[derive(Clone, Debug, Default)]
pub struct EpochVoteAggregator {
    tallies: HashMap<(CheckpointIndex, u64), VoteTally>,
}

impl EpochVoteAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a submission without applying it.
    pub fn check_submit(
        &self,
        target: CheckpointIndex,
        target_epoch: u64,
        validator: &Address,
        dynasties: &DynastyManager,
    ) -> CasperResult<()> {
        let mut active = false;
        for snapshot in dynasties.voting_dynasties() {
            let Some(entry) = snapshot.get(validator) else {
                continue;
            };
            active = true;
            let counted = self
                .tallies
                .get(&(target, snapshot.dynasty()))
                .is_some_and(|t| t.has_voted(entry.index));
            if counted {
                return Err(CasperError::DuplicateVote {
                    validator: *validator,
                    target_epoch,
                });
            }
        }

        if !active {
            return Err(CasperError::NotActiveValidator {
                validator: *validator,
                dynasty: dynasties.current(),
            });
        }
        Ok(())
    }

    /// Add the validator's frozen stake to the target's tally in every voting
    /// dynasty it belongs to.
    pub fn submit(
        &mut self,
        target: CheckpointIndex,
        target_epoch: u64,
        validator: &Address,
        dynasties: &DynastyManager,
    ) -> CasperResult<TallyUpdate> {
        self.check_submit(target, target_epoch, validator, dynasties)?;

        for snapshot in dynasties.voting_dynasties() {
            if let Some(entry) = snapshot.get(validator) {
                self.tallies
                    .entry((target, snapshot.dynasty()))
                    .or_insert_with(|| VoteTally::new(snapshot.len()))
                    .add(entry.index, entry.stake);
            }
        }

        Ok(self.tally(target, dynasties))
    }

    /// Current weights of a target across the voting dynasties
    pub fn tally(&self, target: CheckpointIndex, dynasties: &DynastyManager) -> TallyUpdate {
        let tallies = dynasties
            .voting_dynasties()
            .map(|snapshot| DynastyTally {
                dynasty: snapshot.dynasty(),
                weight: self.weight(target, snapshot.dynasty()),
                total: snapshot.total_stake(),
            })
            .collect();
        TallyUpdate { target, tallies }
    }

    /// Stake counted for a target in a dynasty
    pub fn weight(&self, target: CheckpointIndex, dynasty: u64) -> u128 {
        self.tallies
            .get(&(target, dynasty))
            .map(|t| t.stake)
            .unwrap_or(0)
    }

    /// Raw tally for a target in a dynasty
    pub fn get(&self, target: CheckpointIndex, dynasty: u64) -> Option<&VoteTally> {
        self.tallies.get(&(target, dynasty))
    }
}
