//! Driving Ports (API - Inbound)
//!
//! The externally callable contract surface. Caller identity is passed
//! explicitly and is trusted as envelope identity; vote authorship is always
//! proven by signature.

use crate::domain::{Address, Checkpoint, CheckpointProposal, CheckpointState, DynastyTally};
use crate::domain::{Hash, SlashingEvidence, ValidatorRecord, Vote};
use crate::error::{CasperError, CasperResult};
use async_trait::async_trait;

/// Result of an accepted vote
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Target tallies after counting, current dynasty first
    pub tallies: Vec<DynastyTally>,
    /// Target became justified
    pub justified: Option<Checkpoint>,
    /// Checkpoints finalized as a consequence, oldest first
    pub finalized: Vec<Checkpoint>,
}

/// Result of processing a batch of votes
#[derive(Clone, Debug, Default)]
pub struct BatchVoteResult {
    /// Per-vote outcome in submission order
    pub outcomes: Vec<CasperResult<VoteOutcome>>,
}

impl BatchVoteResult {
    /// Number of accepted votes
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Number of rejected votes
    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.accepted()
    }

    /// Rejections with their batch position
    pub fn errors(&self) -> impl Iterator<Item = (usize, &CasperError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().err().map(|e| (i, e)))
    }
}

/// Result of a successful challenge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashReceipt {
    pub validator: Address,
    pub confiscated: u128,
    /// Paid to the challenger
    pub reward: u128,
    /// Destroyed
    pub burned: u128,
    pub evidence: SlashingEvidence,
}

/// Result of re-evaluating a checkpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JustifyOutcome {
    pub checkpoint: Checkpoint,
    pub state: CheckpointState,
    pub tallies: Vec<DynastyTally>,
    /// Checkpoints finalized by this call, oldest first
    pub finalized: Vec<Checkpoint>,
}

/// Primary Casper API
///
/// This is the driving port of the staking and finality core.
#[async_trait]
pub trait CasperApi: Send + Sync {
    /// Lock stake for `validator`. Returns the start dynasty.
    async fn deposit(&self, validator: Address, amount: u128) -> CasperResult<u64>;

    /// Schedule withdrawal. Returns the end dynasty.
    async fn request_withdraw(&self, validator: Address) -> CasperResult<u64>;

    /// Release matured stake. Returns the released amount.
    async fn withdraw(&self, validator: Address) -> CasperResult<u128>;

    /// Add a checkpoint to the tree.
    async fn propose(&self, proposer: Address, proposal: CheckpointProposal)
        -> CasperResult<Checkpoint>;

    /// Submit a signed vote.
    async fn vote(&self, vote: Vote) -> CasperResult<VoteOutcome>;

    /// Submit a vote in its raw encoded form.
    async fn push_vote_msg(&self, raw: Vec<u8>) -> CasperResult<VoteOutcome>;

    /// Submit votes in order; each one is applied or rejected on its own.
    async fn batch_vote(&self, votes: Vec<Vote>) -> BatchVoteResult;

    /// Prove misbehavior with two conflicting signed votes.
    async fn challenge(
        &self,
        challenger: Address,
        vote_a: Vote,
        vote_b: Vote,
    ) -> CasperResult<SlashReceipt>;

    /// `challenge` with raw vote messages.
    async fn slash(
        &self,
        challenger: Address,
        raw_a: Vec<u8>,
        raw_b: Vec<u8>,
    ) -> CasperResult<SlashReceipt>;

    /// Re-evaluate justification and finalization for a checkpoint.
    async fn justify(&self, block_hash: Hash) -> CasperResult<JustifyOutcome>;

    /// Advance the block-height clock.
    async fn on_new_block(&self, height: u64) -> CasperResult<()>;

    async fn current_dynasty(&self) -> u64;

    async fn current_epoch(&self) -> u64;

    async fn validator(&self, address: Address) -> Option<ValidatorRecord>;

    async fn checkpoint(&self, block_hash: Hash) -> Option<Checkpoint>;

    async fn last_justified(&self) -> Checkpoint;

    async fn last_finalized(&self) -> Checkpoint;

    async fn total_locked(&self) -> u128;

    /// Every offense recorded so far
    async fn slashing_evidence(&self) -> Vec<SlashingEvidence>;
}
