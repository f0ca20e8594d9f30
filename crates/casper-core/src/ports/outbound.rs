//! Driven Ports (SPI - Outbound Dependencies)
//!
//! All driven ports are synchronous: the service calls them while holding the
//! state write lock, between validation and mutation.

use crate::domain::{Address, Vote};
use crate::error::CasperResult;
use crate::events::CasperEvent;

/// Token balances backing locked stake.
///
/// Every method either applies fully or fails with no effect.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from the owner's spendable balance into locked stake
    fn lock(&self, owner: &Address, amount: u128) -> CasperResult<()>;

    /// Move `amount` of locked stake back to the owner's spendable balance
    fn unlock(&self, owner: &Address, amount: u128) -> CasperResult<()>;

    /// Take `amount` of the owner's locked stake: pay `reward.1` of it to
    /// `reward.0`'s spendable balance and destroy the rest
    fn confiscate_locked(
        &self,
        owner: &Address,
        amount: u128,
        reward: Option<(Address, u128)>,
    ) -> CasperResult<()>;
}

/// Signature recovery for votes
///
/// Every vote is re-verified independently; nothing upstream is trusted.
pub trait VoteVerifier: Send + Sync {
    /// Recover the address that signed the vote digest
    fn recover_signer(&self, vote: &Vote) -> CasperResult<Address>;
}

/// Sink for committed state changes
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: CasperEvent);
}
