//! # Casper Metrics
//!
//! Prometheus metrics for stake and finality.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! casper-core = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `casper_deposits_total` - Counter of accepted deposits
//! - `casper_withdrawals_total` - Counter of completed withdrawals
//! - `casper_votes_accepted_total` - Counter of counted votes
//! - `casper_calls_rejected_total` - Counter of rejected calls (by error kind)
//! - `casper_checkpoints_justified_total` - Counter of justified checkpoints
//! - `casper_checkpoints_finalized_total` - Counter of finalized checkpoints
//! - `casper_slashings_total` - Counter of slashings (by offense)
//! - `casper_dynasty` - Gauge of the current dynasty
//! - `casper_locked_stake` - Gauge of total locked stake (token units)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, register_int_gauge, CounterVec,
    Gauge, IntCounter, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref DEPOSITS: IntCounter = register_int_counter!(
        "casper_deposits_total",
        "Total number of accepted deposits"
    )
    .expect("Failed to create DEPOSITS metric");

    pub static ref WITHDRAWALS: IntCounter = register_int_counter!(
        "casper_withdrawals_total",
        "Total number of completed withdrawals"
    )
    .expect("Failed to create WITHDRAWALS metric");

    pub static ref VOTES_ACCEPTED: IntCounter = register_int_counter!(
        "casper_votes_accepted_total",
        "Total number of votes counted"
    )
    .expect("Failed to create VOTES_ACCEPTED metric");

    /// Rejected calls, labeled by error kind
    pub static ref CALLS_REJECTED: CounterVec = register_counter_vec!(
        "casper_calls_rejected_total",
        "Total number of rejected calls",
        &["kind"]
    )
    .expect("Failed to create CALLS_REJECTED metric");

    pub static ref CHECKPOINTS_JUSTIFIED: IntCounter = register_int_counter!(
        "casper_checkpoints_justified_total",
        "Total number of checkpoints justified"
    )
    .expect("Failed to create CHECKPOINTS_JUSTIFIED metric");

    pub static ref CHECKPOINTS_FINALIZED: IntCounter = register_int_counter!(
        "casper_checkpoints_finalized_total",
        "Total number of checkpoints finalized"
    )
    .expect("Failed to create CHECKPOINTS_FINALIZED metric");

    /// Slashings, labeled by offense
    pub static ref SLASHINGS: CounterVec = register_counter_vec!(
        "casper_slashings_total",
        "Total number of validators slashed",
        &["offense"]
    )
    .expect("Failed to create SLASHINGS metric");

    pub static ref DYNASTY: IntGauge = register_int_gauge!(
        "casper_dynasty",
        "Current dynasty"
    )
    .expect("Failed to create DYNASTY metric");

    /// Locked stake in whole tokens (lossy above f64 precision)
    pub static ref LOCKED_STAKE: Gauge = register_gauge!(
        "casper_locked_stake",
        "Total locked stake"
    )
    .expect("Failed to create LOCKED_STAKE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_deposit() {
    DEPOSITS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_withdrawal() {
    WITHDRAWALS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_vote_accepted() {
    VOTES_ACCEPTED.inc();
}

/// Record a rejected call with its error kind
#[cfg(feature = "metrics")]
pub fn record_rejected(kind: &str) {
    CALLS_REJECTED.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_checkpoint_justified() {
    CHECKPOINTS_JUSTIFIED.inc();
}

/// Record a finalization and the dynasty it opened
#[cfg(feature = "metrics")]
pub fn record_checkpoint_finalized(new_dynasty: u64) {
    CHECKPOINTS_FINALIZED.inc();
    DYNASTY.set(i64::try_from(new_dynasty).unwrap_or(i64::MAX));
}

#[cfg(feature = "metrics")]
pub fn record_slashing(offense: &str) {
    SLASHINGS.with_label_values(&[offense]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_locked_stake(amount: u128) {
    LOCKED_STAKE.set(amount as f64 / crate::types::TOKEN_UNIT as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_deposit() {}

#[cfg(not(feature = "metrics"))]
pub fn record_withdrawal() {}

#[cfg(not(feature = "metrics"))]
pub fn record_vote_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_checkpoint_justified() {}

#[cfg(not(feature = "metrics"))]
pub fn record_checkpoint_finalized(_new_dynasty: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_slashing(_offense: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_locked_stake(_amount: u128) {}
