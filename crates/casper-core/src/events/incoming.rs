//! Incoming payloads

use crate::domain::{Address, Vote};
use crate::error::CasperResult;
use serde::{Deserialize, Serialize};

/// Two conflicting votes submitted by a challenger
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeEvidence {
    pub challenger: Address,
    pub vote_a: Vote,
    pub vote_b: Vote,
}

impl ChallengeEvidence {
    pub fn new(challenger: Address, vote_a: Vote, vote_b: Vote) -> Self {
        Self {
            challenger,
            vote_a,
            vote_b,
        }
    }

    /// Decode the raw-message form used by `slash`.
    pub fn from_raw(challenger: Address, raw_a: &[u8], raw_b: &[u8]) -> CasperResult<Self> {
        Ok(Self::new(
            challenger,
            Vote::decode(raw_a)?,
            Vote::decode(raw_b)?,
        ))
    }
}
