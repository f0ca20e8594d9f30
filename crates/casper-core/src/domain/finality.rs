//! # Finality Gadget
//!
//! Owns the checkpoint tree and drives the FFG state machine:
//!
//! - a target is justified once every voting dynasty with stake has reached
//!   quorum on it;
//! - a justified checkpoint is finalized once a justified direct child at the
//!   next epoch exists;
//! - finalizing prunes every competing `Proposed` branch to `Stale`.
//!
//! The gadget never touches stake. Advancing the dynasty on finalization is
//! left to the state object, which also owns the ledger.

use super::aggregator::{Quorum, TallyUpdate};
use super::checkpoint::{
    Checkpoint, CheckpointIndex, CheckpointProposal, CheckpointState, CheckpointTree,
    GENESIS_INDEX,
};
use super::validator::{Address, Hash};
use super::vote::Vote;
use crate::error::{CasperError, CasperResult};

/// Resolved arena positions of a vote's link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteLink {
    pub source: CheckpointIndex,
    pub target: CheckpointIndex,
}

/// State changes produced by one evaluation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalityUpdate {
    /// Newly justified checkpoint
    pub justified: Option<CheckpointIndex>,
    /// Newly finalized checkpoints, oldest first
    pub finalized: Vec<CheckpointIndex>,
    /// Checkpoints marked stale by those finalizations
    pub pruned: Vec<CheckpointIndex>,
}

impl FinalityUpdate {
    pub fn is_empty(&self) -> bool {
        self.justified.is_none() && self.finalized.is_empty()
    }
}

/// FFG justification and finalization over a checkpoint tree.
#[derive(Clone, Debug)]
pub struct FinalityGadget {
    tree: CheckpointTree,
    last_justified: CheckpointIndex,
    last_finalized: CheckpointIndex,
    quorum: Quorum,
}

impl FinalityGadget {
    pub fn new(genesis_hash: Hash, quorum: Quorum) -> Self {
        Self {
            tree: CheckpointTree::genesis(genesis_hash),
            last_justified: GENESIS_INDEX,
            last_finalized: GENESIS_INDEX,
            quorum,
        }
    }

    pub fn tree(&self) -> &CheckpointTree {
        &self.tree
    }

    pub fn quorum(&self) -> Quorum {
        self.quorum
    }

    /// Highest-epoch justified checkpoint
    pub fn last_justified(&self) -> &Checkpoint {
        self.checkpoint(self.last_justified)
    }

    /// Most recently finalized checkpoint
    pub fn last_finalized(&self) -> &Checkpoint {
        self.checkpoint(self.last_finalized)
    }

    fn checkpoint(&self, index: CheckpointIndex) -> &Checkpoint {
        // Tracked indices always point into the arena
        &self.tree[index]
    }

    /// Validate a proposal against the tree and finality.
    pub fn check_proposal(
        &self,
        proposer: &Address,
        proposal: &CheckpointProposal,
    ) -> CasperResult<CheckpointIndex> {
        let finalized = self.last_finalized();
        if proposal.epoch <= finalized.epoch {
            return Err(CasperError::StaleEpoch {
                epoch: proposal.epoch,
                finalized_epoch: finalized.epoch,
            });
        }

        let parent = self.tree.check_proposal(proposer, proposal)?;
        if !self.tree.is_ancestor(self.last_finalized, parent) {
            // Parent sits on a branch that finality already excluded
            let epoch = self.tree.get(parent).map_or(0, |cp| cp.epoch);
            return Err(CasperError::StaleCheckpoint { epoch });
        }
        Ok(parent)
    }

    /// Insert a proposed checkpoint.
    pub fn propose(
        &mut self,
        proposer: Address,
        proposal: &CheckpointProposal,
    ) -> CasperResult<CheckpointIndex> {
        self.check_proposal(&proposer, proposal)?;
        self.tree.propose(proposer, proposal)
    }

    /// Resolve and validate the source → target link of a vote.
    pub fn resolve_link(&self, vote: &Vote) -> CasperResult<VoteLink> {
        let source = self.lookup(&vote.source.block_hash, vote.source.epoch)?;
        let target = self.lookup(&vote.target.block_hash, vote.target.epoch)?;

        if !source.is_justified() {
            return Err(CasperError::UnjustifiedSource {
                epoch: source.epoch,
            });
        }

        if source.epoch >= target.epoch || !self.tree.is_ancestor(source.index, target.index) {
            return Err(CasperError::InvalidVoteLink {
                source_epoch: source.epoch,
                target_epoch: target.epoch,
            });
        }

        if target.is_stale() {
            return Err(CasperError::StaleCheckpoint {
                epoch: target.epoch,
            });
        }

        Ok(VoteLink {
            source: source.index,
            target: target.index,
        })
    }

    fn lookup(&self, block_hash: &Hash, epoch: u64) -> CasperResult<&Checkpoint> {
        let cp = self
            .tree
            .find(block_hash)
            .ok_or(CasperError::UnknownCheckpoint {
                block_hash: *block_hash,
            })?;
        if cp.epoch != epoch {
            return Err(CasperError::EpochMismatch {
                expected: cp.epoch,
                actual: epoch,
            });
        }
        Ok(cp)
    }

    /// Whether every voting dynasty with stake has reached quorum.
    ///
    /// The current dynasty must reach quorum even when it holds no stake, in
    /// which case nothing can ever be justified.
    pub fn has_quorum(&self, tally: &TallyUpdate) -> bool {
        let mut dynasties = tally.tallies.iter();
        let Some(current) = dynasties.next() else {
            return false;
        };
        if !self.quorum.is_reached(current.weight, current.total) {
            return false;
        }
        dynasties
            .filter(|previous| previous.total > 0)
            .all(|previous| self.quorum.is_reached(previous.weight, previous.total))
    }

    /// Apply the justification and finalization rules to a target.
    pub fn evaluate(&mut self, tally: &TallyUpdate) -> FinalityUpdate {
        let mut update = FinalityUpdate::default();
        let target = tally.target;

        let Some(cp) = self.tree.get(target) else {
            return update;
        };
        if cp.is_stale() {
            return update;
        }

        if !cp.is_justified() && self.has_quorum(tally) {
            let weight = tally.tallies.first().map_or(0, |t| t.weight);
            if self.tree.justify(target, weight) {
                self.on_justified(target);
                update.justified = Some(target);
            }
        }

        if !self.checkpoint(target).is_justified() {
            return update;
        }

        // Target as the child: its parent may finalize
        if let Some(parent) = self.tree.get(target).and_then(|cp| cp.parent) {
            if self.is_finalizable(parent, target) {
                self.finalize(parent, &mut update);
            }
        }

        // Target as the parent: a justified child may already exist
        let child = self
            .tree
            .children(target)
            .find(|child| child.is_justified() && child.epoch == self.checkpoint(target).epoch + 1)
            .map(|child| child.index);
        if let Some(child) = child {
            if self.is_finalizable(target, child) {
                self.finalize(target, &mut update);
            }
        }

        update
    }

    fn on_justified(&mut self, index: CheckpointIndex) {
        let cp = self.checkpoint(index);
        tracing::info!(
            "[casper] Justified checkpoint epoch {} with weight {}",
            cp.epoch,
            cp.justified_weight
        );
        if cp.epoch > self.last_justified().epoch {
            self.last_justified = index;
        }
    }

    fn is_finalizable(&self, parent: CheckpointIndex, child: CheckpointIndex) -> bool {
        let (Some(p), Some(c)) = (self.tree.get(parent), self.tree.get(child)) else {
            return false;
        };
        p.state == CheckpointState::Justified
            && c.is_justified()
            && c.epoch == p.epoch + 1
            && p.epoch > self.last_finalized().epoch
            && self.tree.is_ancestor(self.last_finalized, parent)
    }

    fn finalize(&mut self, index: CheckpointIndex, update: &mut FinalityUpdate) {
        if !self.tree.finalize(index) {
            return;
        }
        self.last_finalized = index;
        let pruned = self.tree.prune_conflicting(index);
        tracing::info!(
            "[casper] Finalized checkpoint epoch {}, pruned {} conflicting",
            self.checkpoint(index).epoch,
            pruned.len()
        );
        update.finalized.push(index);
        update.pruned.extend(pruned);
    }
}
