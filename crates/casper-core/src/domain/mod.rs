//! Domain module for the Casper staking and finality core
//!
//! ## Core Modules
//! - validator: Validator records and address/hash aliases
//! - stake_ledger: Locked stake and withdrawal windows
//! - dynasty: Frozen validator snapshots per dynasty
//! - checkpoint: Checkpoint arena
//! - vote: Signed votes and the conflict rules
//! - aggregator: Stake-weighted vote tallies
//! - finality: Justification and finalization
//! - slashing_db: Offense detection and evidence

pub mod aggregator;
pub mod checkpoint;
pub mod dynasty;
pub mod finality;
pub mod slashing_db;
pub mod stake_ledger;
pub mod validator;
pub mod vote;

pub use aggregator::{DynastyTally, EpochVoteAggregator, Quorum, TallyUpdate, VoteTally};
pub use checkpoint::{
    Checkpoint, CheckpointIndex, CheckpointProposal, CheckpointRef, CheckpointState,
    CheckpointTree, GENESIS_INDEX,
};
pub use dynasty::{DynastyManager, DynastySnapshot, SnapshotEntry};
pub use finality::{FinalityGadget, FinalityUpdate, VoteLink};
pub use slashing_db::{DetectorOutcome, SlashingDetector, SlashingEvidence};
pub use stake_ledger::{StakeLedger, DEPOSIT_ACTIVATION_DELAY};
pub use validator::{Address, Hash, ValidatorRecord};
pub use vote::{keccak256, OffenseKind, Vote, VoteSignature, MAX_VOTE_MESSAGE_LEN};
