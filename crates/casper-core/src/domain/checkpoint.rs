//! Checkpoint entity and the checkpoint tree
//!
//! Checkpoints live in an arena and refer to their parent by index. The tree
//! only grows forward in epoch number; branches that lose out to finality are
//! marked `Stale` and kept for auditability.

use super::validator::{Address, Hash};
use crate::error::{CasperError, CasperResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable arena index of a checkpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckpointIndex(pub usize);

/// Genesis always sits at index 0
pub const GENESIS_INDEX: CheckpointIndex = CheckpointIndex(0);

/// Checkpoint finality state
///
/// ```text
/// Proposed ──quorum──→ Justified ──justified child──→ Finalized
///     │
///     └──superseded──→ Stale
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CheckpointState {
    /// Awaiting votes
    #[default]
    Proposed,
    /// Quorum of stake voted for it
    Justified,
    /// Justified with a justified direct child - irreversible
    Finalized,
    /// Superseded without being justified
    Stale,
}

/// Reference to a checkpoint as carried in votes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointRef {
    pub epoch: u64,
    pub block_hash: Hash,
}

impl CheckpointRef {
    pub fn new(epoch: u64, block_hash: Hash) -> Self {
        Self { epoch, block_hash }
    }
}

/// A checkpoint at an epoch boundary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub index: CheckpointIndex,
    pub epoch: u64,
    pub block_hash: Hash,
    pub block_height: u64,
    /// None only for genesis
    pub parent: Option<CheckpointIndex>,
    /// None only for genesis
    pub proposer: Option<Address>,
    pub state: CheckpointState,
    /// Current-dynasty stake that justified it
    pub justified_weight: u128,
}

impl Checkpoint {
    pub fn id(&self) -> CheckpointRef {
        CheckpointRef::new(self.epoch, self.block_hash)
    }

    /// Justified or finalized
    pub fn is_justified(&self) -> bool {
        matches!(
            self.state,
            CheckpointState::Justified | CheckpointState::Finalized
        )
    }

    pub fn is_finalized(&self) -> bool {
        self.state == CheckpointState::Finalized
    }

    pub fn is_stale(&self) -> bool {
        self.state == CheckpointState::Stale
    }
}

/// A checkpoint proposal as submitted through `propose`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointProposal {
    pub epoch: u64,
    pub block_hash: Hash,
    pub block_height: u64,
    pub parent_hash: Hash,
}

/// Arena of checkpoints rooted at genesis
#[derive(Clone, Debug)]
pub struct CheckpointTree {
    nodes: Vec<Checkpoint>,
    by_hash: HashMap<Hash, CheckpointIndex>,
    children: HashMap<CheckpointIndex, Vec<CheckpointIndex>>,
    /// (proposer, epoch) -> proposal
    proposals: HashMap<(Address, u64), CheckpointIndex>,
}

impl CheckpointTree {
    /// Create a tree whose root is the finalized genesis checkpoint
    pub fn genesis(block_hash: Hash) -> Self {
        let root = Checkpoint {
            index: GENESIS_INDEX,
            epoch: 0,
            block_hash,
            block_height: 0,
            parent: None,
            proposer: None,
            state: CheckpointState::Finalized,
            justified_weight: 0,
        };
        let mut by_hash = HashMap::new();
        by_hash.insert(block_hash, GENESIS_INDEX);
        Self {
            nodes: vec![root],
            by_hash,
            children: HashMap::new(),
            proposals: HashMap::new(),
        }
    }

    /// Validate a proposal against the tree shape.
    ///
    /// Height, head and finality checks belong to the caller.
    pub fn check_proposal(
        &self,
        proposer: &Address,
        proposal: &CheckpointProposal,
    ) -> CasperResult<CheckpointIndex> {
        let parent = self
            .find(&proposal.parent_hash)
            .filter(|cp| !cp.is_stale())
            .ok_or(CasperError::UnknownParent {
                parent: proposal.parent_hash,
            })?;

        if proposal.epoch <= parent.epoch {
            return Err(CasperError::EpochMismatch {
                expected: parent.epoch + 1,
                actual: proposal.epoch,
            });
        }

        if self.by_hash.contains_key(&proposal.block_hash) {
            return Err(CasperError::DuplicateCheckpoint {
                block_hash: proposal.block_hash,
            });
        }

        if let Some(existing) = self.proposals.get(&(*proposer, proposal.epoch)) {
            if self.nodes[existing.0].state == CheckpointState::Proposed {
                return Err(CasperError::DuplicateEpoch {
                    proposer: *proposer,
                    epoch: proposal.epoch,
                });
            }
        }

        Ok(parent.index)
    }

    /// Insert a new `Proposed` checkpoint
    pub fn propose(
        &mut self,
        proposer: Address,
        proposal: &CheckpointProposal,
    ) -> CasperResult<CheckpointIndex> {
        let parent = self.check_proposal(&proposer, proposal)?;
        let index = CheckpointIndex(self.nodes.len());

        self.nodes.push(Checkpoint {
            index,
            epoch: proposal.epoch,
            block_hash: proposal.block_hash,
            block_height: proposal.block_height,
            parent: Some(parent),
            proposer: Some(proposer),
            state: CheckpointState::Proposed,
            justified_weight: 0,
        });
        self.by_hash.insert(proposal.block_hash, index);
        self.children.entry(parent).or_default().push(index);
        self.proposals.insert((proposer, proposal.epoch), index);
        Ok(index)
    }

    pub fn get(&self, index: CheckpointIndex) -> Option<&Checkpoint> {
        self.nodes.get(index.0)
    }

    /// Look up a checkpoint by block hash
    pub fn find(&self, block_hash: &Hash) -> Option<&Checkpoint> {
        self.by_hash.get(block_hash).and_then(|i| self.nodes.get(i.0))
    }

    pub fn parent(&self, index: CheckpointIndex) -> Option<&Checkpoint> {
        self.get(index)?.parent.and_then(|p| self.get(p))
    }

    /// Direct children of a checkpoint
    pub fn children(&self, index: CheckpointIndex) -> impl Iterator<Item = &Checkpoint> {
        self.children
            .get(&index)
            .into_iter()
            .flatten()
            .filter_map(|i| self.nodes.get(i.0))
    }

    /// Whether `ancestor` lies on the parent chain of `descendant` (or is it)
    pub fn is_ancestor(&self, ancestor: CheckpointIndex, descendant: CheckpointIndex) -> bool {
        let mut cursor = Some(descendant);
        while let Some(index) = cursor {
            if index == ancestor {
                return true;
            }
            cursor = self.nodes.get(index.0).and_then(|cp| cp.parent);
        }
        false
    }

    /// `Proposed → Justified`. Returns true if state changed.
    pub fn justify(&mut self, index: CheckpointIndex, weight: u128) -> bool {
        match self.nodes.get_mut(index.0) {
            Some(cp) if cp.state == CheckpointState::Proposed => {
                cp.state = CheckpointState::Justified;
                cp.justified_weight = weight;
                true
            }
            _ => false,
        }
    }

    /// `Justified → Finalized`. Returns true if state changed.
    pub fn finalize(&mut self, index: CheckpointIndex) -> bool {
        match self.nodes.get_mut(index.0) {
            Some(cp) if cp.state == CheckpointState::Justified => {
                cp.state = CheckpointState::Finalized;
                true
            }
            _ => false,
        }
    }

    /// Mark every `Proposed` checkpoint off the chain through `finalized` as
    /// `Stale`. Returns the pruned indices.
    pub fn prune_conflicting(&mut self, finalized: CheckpointIndex) -> Vec<CheckpointIndex> {
        let conflicting: Vec<CheckpointIndex> = self
            .nodes
            .iter()
            .filter(|cp| cp.state == CheckpointState::Proposed)
            .map(|cp| cp.index)
            .filter(|&i| !self.is_ancestor(i, finalized) && !self.is_ancestor(finalized, i))
            .collect();

        for index in &conflicting {
            self.nodes[index.0].state = CheckpointState::Stale;
        }
        conflicting
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.nodes.iter()
    }
}

impl std::ops::Index<CheckpointIndex> for CheckpointTree {
    type Output = Checkpoint;

    fn index(&self, index: CheckpointIndex) -> &Checkpoint {
        &self.nodes[index.0]
    }
}
