//! Single state object guarded by the service lock.
//!
//! Every method here is synchronous and either validates without mutating
//! (`check_*`) or applies a change that has already been validated. The
//! service interleaves token-ledger calls between the two halves.

use crate::domain::{
    Address, Checkpoint, CheckpointIndex, CheckpointProposal, DetectorOutcome, DynastyManager,
    EpochVoteAggregator, FinalityGadget, FinalityUpdate, SlashingDetector, SlashingEvidence,
    Hash, StakeLedger, TallyUpdate, Vote, VoteLink,
};
use crate::error::{CasperError, CasperResult};
use crate::types::CasperConfig;
use tracing::info;

/// What to do with a vote that passed structural validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteCheck {
    /// Count it
    Accept(VoteLink),
    /// Slash its author
    Offense(SlashingEvidence),
}

/// A finalization together with the dynasty it opened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finalization {
    pub checkpoint: Checkpoint,
    pub new_dynasty: u64,
}

/// Everything a counted vote changed
#[derive(Clone, Debug)]
pub struct AppliedVote {
    pub tally: TallyUpdate,
    pub justified: Option<Checkpoint>,
    pub finalized: Vec<Finalization>,
}

pub struct CasperState {
    pub ledger: StakeLedger,
    pub dynasties: DynastyManager,
    pub gadget: FinalityGadget,
    pub aggregator: EpochVoteAggregator,
    pub detector: SlashingDetector,
    /// Latest block height seen
    pub head_height: u64,
    pub epoch_length: u64,
}

impl CasperState {
    /// Build genesis state: configured validators active from dynasty 0 and a
    /// finalized genesis checkpoint.
    pub fn new(config: &CasperConfig) -> Self {
        let mut ledger = StakeLedger::new(config.min_deposit, config.withdrawal_delay);
        for v in &config.genesis_validators {
            ledger.register_genesis(v.address, v.stake);
        }
        let dynasties = DynastyManager::genesis(&ledger);
        info!(
            "[casper] Genesis: {} validators, {} total stake",
            dynasties.current_snapshot().len(),
            dynasties.current_snapshot().total_stake()
        );

        Self {
            ledger,
            dynasties,
            gadget: FinalityGadget::new(config.genesis_hash, config.quorum),
            aggregator: EpochVoteAggregator::new(),
            detector: SlashingDetector::new(),
            head_height: 0,
            epoch_length: config.epoch_length,
        }
    }

    /// Epoch of the current head
    pub fn current_epoch(&self) -> u64 {
        self.head_height / self.epoch_length
    }

    /// Move the head forward. Heights never decrease.
    pub fn advance_head(&mut self, height: u64) -> CasperResult<()> {
        if height < self.head_height {
            return Err(CasperError::HeightRegression {
                head: self.head_height,
                height,
            });
        }
        self.head_height = height;
        Ok(())
    }

    /// Validate a checkpoint proposal. Returns the parent index.
    pub fn check_proposal(
        &self,
        proposer: &Address,
        proposal: &CheckpointProposal,
    ) -> CasperResult<CheckpointIndex> {
        let record = self
            .ledger
            .get(proposer)
            .ok_or(CasperError::NotDeposited {
                validator: *proposer,
            })?;
        if record.slashed {
            return Err(CasperError::AlreadySlashed {
                validator: *proposer,
            });
        }

        // Checkpoint for epoch e sits at height e * epoch_length
        let boundary = proposal.epoch.saturating_mul(self.epoch_length);
        if boundary != proposal.block_height {
            return Err(CasperError::EpochMismatch {
                expected: boundary,
                actual: proposal.block_height,
            });
        }

        if proposal.block_height > self.head_height {
            return Err(CasperError::FutureCheckpoint {
                height: proposal.block_height,
                head: self.head_height,
            });
        }

        self.gadget.check_proposal(proposer, proposal)
    }

    /// Validate a vote whose signature has been verified.
    pub fn check_vote(&self, vote: &Vote) -> CasperResult<VoteCheck> {
        let link = self.gadget.resolve_link(vote)?;

        // A withdrawn validator lingers in the previous dynasty's snapshot but
        // has no stake left to confiscate
        let slashable = self
            .ledger
            .get(&vote.validator)
            .is_some_and(|r| !r.slashed && r.stake > 0);
        if !slashable || !self.dynasties.is_voting_validator(&vote.validator) {
            return Err(CasperError::NotActiveValidator {
                validator: vote.validator,
                dynasty: self.dynasties.current(),
            });
        }

        match self.detector.check(vote) {
            DetectorOutcome::Duplicate => Err(CasperError::DuplicateVote {
                validator: vote.validator,
                target_epoch: vote.target.epoch,
            }),
            DetectorOutcome::Offense(evidence) => Ok(VoteCheck::Offense(evidence)),
            DetectorOutcome::Fresh => {
                self.aggregator.check_submit(
                    link.target,
                    vote.target.epoch,
                    &vote.validator,
                    &self.dynasties,
                )?;
                Ok(VoteCheck::Accept(link))
            }
        }
    }

    /// Count a checked vote and run the finality rules on its target.
    pub fn apply_vote(&mut self, vote: Vote, link: VoteLink) -> CasperResult<AppliedVote> {
        let tally = self.aggregator.submit(
            link.target,
            vote.target.epoch,
            &vote.validator,
            &self.dynasties,
        )?;
        self.detector.record(vote);

        let update = self.gadget.evaluate(&tally);
        let (justified, finalized) = self.apply_finality(update);
        Ok(AppliedVote {
            tally,
            justified,
            finalized,
        })
    }

    /// Re-run the finality rules on a checkpoint with its current tallies.
    pub fn reevaluate(&mut self, index: CheckpointIndex) -> AppliedVote {
        let tally = self.aggregator.tally(index, &self.dynasties);
        let update = self.gadget.evaluate(&tally);
        let (justified, finalized) = self.apply_finality(update);
        AppliedVote {
            tally,
            justified,
            finalized,
        }
    }

    /// Advance one dynasty per finalized checkpoint.
    fn apply_finality(
        &mut self,
        update: FinalityUpdate,
    ) -> (Option<Checkpoint>, Vec<Finalization>) {
        let justified = update
            .justified
            .and_then(|i| self.gadget.tree().get(i).cloned());

        let mut finalized = Vec::with_capacity(update.finalized.len());
        for index in update.finalized {
            if let Some(checkpoint) = self.gadget.tree().get(index).cloned() {
                let new_dynasty = self.dynasties.advance(&self.ledger);
                finalized.push(Finalization {
                    checkpoint,
                    new_dynasty,
                });
            }
        }

        (justified, finalized)
    }

    /// Validate an offense. Returns the stake that would be confiscated.
    pub fn check_slash(&self, evidence: &SlashingEvidence) -> CasperResult<u128> {
        self.ledger.check_confiscate(&evidence.validator())
    }

    /// Confiscate the offender's stake and log the evidence.
    pub fn apply_slash(&mut self, evidence: SlashingEvidence) -> CasperResult<u128> {
        let amount = self
            .ledger
            .confiscate(&evidence.validator(), self.dynasties.current())?;
        self.detector.record_offense(evidence);
        Ok(amount)
    }

    /// Look up a checkpoint by block hash
    pub fn checkpoint(&self, block_hash: &Hash) -> Option<&Checkpoint> {
        self.gadget.tree().find(block_hash)
    }
}
