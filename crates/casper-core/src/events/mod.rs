//! Events module for the Casper core

pub mod incoming;
pub mod outgoing;

pub use incoming::ChallengeEvidence;
pub use outgoing::CasperEvent;
