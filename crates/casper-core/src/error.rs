//! Error types for the Casper staking core
//!
//! Every error is a synchronous rejection of the triggering call. The two
//! detection errors (`EquivocationDetected`, `SurroundVoteDetected`) are the
//! exception: the offender's stake is confiscated before they are returned.

use crate::domain::Address;
use thiserror::Error;

/// Casper staking core errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CasperError {
    /// Deposit amount at or below the configured minimum, or zero
    #[error("Invalid amount {amount}: must exceed {minimum}")]
    InvalidAmount { amount: u128, minimum: u128 },

    /// Validator has no locked stake
    #[error("Validator {validator:?} has no deposit")]
    NotDeposited { validator: Address },

    /// Withdrawal already pending
    #[error("Withdrawal already requested by {validator:?}")]
    AlreadyRequested { validator: Address },

    /// Withdrawal dynasty not reached yet
    #[error("Stake not matured: current dynasty {current}, withdrawable at {end_dynasty:?}")]
    NotMatured {
        current: u64,
        end_dynasty: Option<u64>,
    },

    /// Stake was confiscated
    #[error("Validator {validator:?} has been slashed")]
    AlreadySlashed { validator: Address },

    /// Vote source is not a justified checkpoint
    #[error("Vote source at epoch {epoch} is not justified")]
    UnjustifiedSource { epoch: u64 },

    /// Validator not in any voting dynasty snapshot
    #[error("Validator {validator:?} is not active in dynasty {dynasty}")]
    NotActiveValidator { validator: Address, dynasty: u64 },

    /// Proposal parent unknown or pruned
    #[error("Unknown parent checkpoint: {parent:?}")]
    UnknownParent { parent: [u8; 32] },

    /// Proposer already has a pending proposal for this epoch
    #[error("Proposer {proposer:?} already proposed a checkpoint for epoch {epoch}")]
    DuplicateEpoch { proposer: Address, epoch: u64 },

    /// Two different votes for the same target epoch
    #[error("Equivocation by {validator:?} at target epoch {target_epoch}, stake confiscated")]
    EquivocationDetected {
        validator: Address,
        target_epoch: u64,
    },

    /// Vote interval surrounds, or is surrounded by, a previous vote
    #[error("Surround vote by {validator:?}, stake confiscated")]
    SurroundVoteDetected { validator: Address },

    /// Recovered signer does not match the vote
    #[error("Invalid vote signature for validator {validator:?}")]
    InvalidSignature { validator: Address },

    /// Raw vote message could not be decoded
    #[error("Malformed vote message: {reason}")]
    MalformedVote { reason: String },

    /// Vote references an untracked checkpoint
    #[error("Unknown checkpoint: {block_hash:?}")]
    UnknownCheckpoint { block_hash: [u8; 32] },

    /// Epoch does not match the checkpoint or block height
    #[error("Epoch mismatch: expected {expected}, got {actual}")]
    EpochMismatch { expected: u64, actual: u64 },

    /// Source is not an earlier ancestor of the target
    #[error("Invalid vote link: source epoch {source_epoch} -> target epoch {target_epoch}")]
    InvalidVoteLink { source_epoch: u64, target_epoch: u64 },

    /// Vote targets a pruned checkpoint
    #[error("Checkpoint at epoch {epoch} is stale")]
    StaleCheckpoint { epoch: u64 },

    /// Identical vote already counted
    #[error("Duplicate vote from {validator:?} for target epoch {target_epoch}")]
    DuplicateVote {
        validator: Address,
        target_epoch: u64,
    },

    /// Block hash already tracked
    #[error("Checkpoint already tracked: {block_hash:?}")]
    DuplicateCheckpoint { block_hash: [u8; 32] },

    /// Checkpoint block is above the current head
    #[error("Checkpoint height {height} is above head {head}")]
    FutureCheckpoint { height: u64, head: u64 },

    /// Epoch already covered by finality
    #[error("Epoch {epoch} is at or below finalized epoch {finalized_epoch}")]
    StaleEpoch { epoch: u64, finalized_epoch: u64 },

    /// Challenge evidence does not prove an offense
    #[error("Invalid slashing evidence: {reason}")]
    InvalidEvidence { reason: String },

    /// Block height clock moved backwards
    #[error("Block height regression: head {head}, got {height}")]
    HeightRegression { head: u64, height: u64 },

    /// Token ledger collaborator rejected the operation
    #[error("Token ledger error: {reason}")]
    Ledger { reason: String },

    /// Configuration failed validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Result type for Casper operations
pub type CasperResult<T> = Result<T, CasperError>;

impl CasperError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::NotDeposited { .. } => "not_deposited",
            Self::AlreadyRequested { .. } => "already_requested",
            Self::NotMatured { .. } => "not_matured",
            Self::AlreadySlashed { .. } => "already_slashed",
            Self::UnjustifiedSource { .. } => "unjustified_source",
            Self::NotActiveValidator { .. } => "not_active_validator",
            Self::UnknownParent { .. } => "unknown_parent",
            Self::DuplicateEpoch { .. } => "duplicate_epoch",
            Self::EquivocationDetected { .. } => "equivocation",
            Self::SurroundVoteDetected { .. } => "surround_vote",
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::MalformedVote { .. } => "malformed_vote",
            Self::UnknownCheckpoint { .. } => "unknown_checkpoint",
            Self::EpochMismatch { .. } => "epoch_mismatch",
            Self::InvalidVoteLink { .. } => "invalid_vote_link",
            Self::StaleCheckpoint { .. } => "stale_checkpoint",
            Self::DuplicateVote { .. } => "duplicate_vote",
            Self::DuplicateCheckpoint { .. } => "duplicate_checkpoint",
            Self::FutureCheckpoint { .. } => "future_checkpoint",
            Self::StaleEpoch { .. } => "stale_epoch",
            Self::InvalidEvidence { .. } => "invalid_evidence",
            Self::HeightRegression { .. } => "height_regression",
            Self::Ledger { .. } => "ledger",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }

    /// Whether the call confiscated the offender's stake before failing
    pub fn is_slashing(&self) -> bool {
        matches!(
            self,
            Self::EquivocationDetected { .. } | Self::SurroundVoteDetected { .. }
        )
    }
}
