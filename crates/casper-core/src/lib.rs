//! # casper-core
//!
//! Proof-of-stake staking core with Casper FFG finality and slashing.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Stake Ledger**: Deposits, delayed withdrawals and confiscation
//! - **Dynasties**: Validator sets that rotate once per finalized checkpoint
//! - **Finality Gadget**: Two-phase finality (justified → finalized) over a
//!   checkpoint tree
//! - **Slashing**: Equivocation and surround-vote detection, challenges with
//!   a challenger reward
//!
//! ## Architecture
//!
//! ```text
//! caller ──deposit/vote/challenge──→ CasperService ──lock/unlock/confiscate──→ TokenLedger
//!                                        │
//!                                        ├── recover_signer ──→ VoteVerifier
//!                                        │
//!                                        └── CasperEvent ──→ EventPublisher
//! ```
//!
//! Every call runs under one write lock: validate, move tokens, mutate state,
//! publish. A rejected call changes nothing, with one exception: a vote that
//! proves its author's offense still confiscates the stake before the vote
//! itself is rejected.
//!
//! ## Finality Rules
//!
//! | Step | Condition |
//! |------|-----------|
//! | Justify | ≥ 2/3 of current dynasty stake, and of previous dynasty stake when non-zero |
//! | Finalize | Justified checkpoint with a justified direct child (epoch + 1) |
//! | Rotate | Each finalization opens the next dynasty |
//!
//! ## Example
//!
//! ```rust,ignore
//! use casper_core::{CasperConfig, CasperService};
//! use casper_core::adapters::{BroadcastEventPublisher, EcdsaVoteVerifier, InMemoryTokenLedger};
//! use casper_core::ports::inbound::CasperApi;
//!
//! let service = CasperService::new(
//!     CasperConfig::from_env()?,
//!     Arc::new(InMemoryTokenLedger::default()),
//!     Arc::new(EcdsaVoteVerifier::new()),
//!     Arc::new(BroadcastEventPublisher::new(1024)),
//! )?;
//!
//! let start_dynasty = service.deposit(validator, amount).await?;
//! let outcome = service.push_vote_msg(raw_vote).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;
pub mod types;

pub use domain::{
    Address, Checkpoint, CheckpointProposal, CheckpointRef, CheckpointState, Hash,
    SlashingEvidence, ValidatorRecord, Vote, VoteSignature,
};
pub use error::{CasperError, CasperResult};
pub use events::{CasperEvent, ChallengeEvidence};
pub use ports::inbound::{BatchVoteResult, CasperApi, JustifyOutcome, SlashReceipt, VoteOutcome};
pub use ports::outbound::{EventPublisher, TokenLedger, VoteVerifier};
pub use service::CasperService;
pub use types::{CasperConfig, GenesisValidator, TokenMetadata};
