//! Ports module for the Casper core

pub mod inbound;
pub mod outbound;

pub use inbound::{BatchVoteResult, CasperApi, JustifyOutcome, SlashReceipt, VoteOutcome};
pub use outbound::{EventPublisher, TokenLedger, VoteVerifier};
