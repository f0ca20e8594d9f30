//! # Integration Tests
//!
//! End-to-end flows through `CasperApi` with real ECDSA-signed votes.
//!
//! - `lifecycle`: deposit, activation, justification, finalization,
//!   dynasty rotation and withdrawal
//! - `forks`: competing checkpoints and stale branches

pub mod forks;
pub mod lifecycle;
