//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits.

mod event_publisher;
mod signature_verifier;
mod token_ledger;

pub use event_publisher::{BroadcastEventPublisher, RecordingEventPublisher};
pub use signature_verifier::{address_of, recover_address, EcdsaVoteVerifier, VoteSigner};
pub use token_ledger::InMemoryTokenLedger;
