//! Outgoing events
//!
//! Published in the order the corresponding state changes are committed.

use crate::domain::{Address, Hash};
use serde::{Deserialize, Serialize};

/// Event emitted by the Casper core
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasperEvent {
    Deposit {
        validator: Address,
        amount: u128,
        start_dynasty: u64,
    },
    WithdrawRequested {
        validator: Address,
        end_dynasty: u64,
    },
    Withdraw {
        validator: Address,
        amount: u128,
    },
    Propose {
        checkpoint: Hash,
        epoch: u64,
        parent: Hash,
    },
    Vote {
        validator: Address,
        source_epoch: u64,
        target_epoch: u64,
        target_checkpoint: Hash,
    },
    Justify {
        checkpoint: Hash,
        epoch: u64,
        /// Current-dynasty stake that reached quorum
        total_stake_weight: u128,
    },
    Finalize {
        checkpoint: Hash,
        epoch: u64,
        new_dynasty: u64,
    },
    Slash {
        validator: Address,
        confiscated_amount: u128,
        /// None when detected on submission
        challenger: Option<Address>,
    },
}

impl CasperEvent {
    /// Short label for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::WithdrawRequested { .. } => "withdraw_requested",
            Self::Withdraw { .. } => "withdraw",
            Self::Propose { .. } => "propose",
            Self::Vote { .. } => "vote",
            Self::Justify { .. } => "justify",
            Self::Finalize { .. } => "finalize",
            Self::Slash { .. } => "slash",
        }
    }
}
