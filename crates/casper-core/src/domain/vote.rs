//! Vote entity
//!
//! A vote is a validator's signed statement linking a justified source
//! checkpoint to a target checkpoint. The raw wire form used by
//! `push_vote_msg` and `slash` is the bincode encoding of [`Vote`].

use super::checkpoint::CheckpointRef;
use super::validator::{Address, Hash};
use crate::error::{CasperError, CasperResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha3::{Digest, Keccak256};

/// Domain separator for vote digests
const VOTE_DOMAIN: &[u8] = b"casper-ffg-vote";

/// Upper bound on accepted raw vote messages
pub const MAX_VOTE_MESSAGE_LEN: usize = 512;

/// Keccak-256 hash
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Recoverable secp256k1 signature: r (32) || s (32) || v (1)
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSignature(#[serde_as(as = "Bytes")] pub [u8; 65]);

impl VoteSignature {
    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }
}

impl Default for VoteSignature {
    fn default() -> Self {
        Self([0u8; 65])
    }
}

/// Kind of safety violation between two votes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffenseKind {
    /// Same target epoch, different target block
    Equivocation,
    /// One interval strictly contains the other
    SurroundVote,
}

impl OffenseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equivocation => "equivocation",
            Self::SurroundVote => "surround_vote",
        }
    }
}

/// Validator vote for a source → target link
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub validator: Address,
    /// Must be a justified ancestor of the target
    pub source: CheckpointRef,
    /// Candidate for justification
    pub target: CheckpointRef,
    pub signature: VoteSignature,
}

impl Vote {
    pub fn new(
        validator: Address,
        source: CheckpointRef,
        target: CheckpointRef,
        signature: VoteSignature,
    ) -> Self {
        Self {
            validator,
            source,
            target,
            signature,
        }
    }

    /// Message the validator signs
    pub fn signing_message(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(VOTE_DOMAIN.len() + 20 + 2 * (8 + 32));
        message.extend_from_slice(VOTE_DOMAIN);
        message.extend_from_slice(&self.validator);
        message.extend_from_slice(&self.source.epoch.to_be_bytes());
        message.extend_from_slice(&self.source.block_hash);
        message.extend_from_slice(&self.target.epoch.to_be_bytes());
        message.extend_from_slice(&self.target.block_hash);
        message
    }

    /// Keccak-256 digest of the signing message
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_message())
    }

    /// Encode into the raw message form
    pub fn encode(&self) -> CasperResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CasperError::MalformedVote {
            reason: e.to_string(),
        })
    }

    /// Decode a raw vote message
    pub fn decode(bytes: &[u8]) -> CasperResult<Self> {
        if bytes.is_empty() || bytes.len() > MAX_VOTE_MESSAGE_LEN {
            return Err(CasperError::MalformedVote {
                reason: format!("message length {} out of bounds", bytes.len()),
            });
        }
        bincode::deserialize(bytes).map_err(|e| CasperError::MalformedVote {
            reason: e.to_string(),
        })
    }

    /// Same vote content, signature aside
    pub fn same_link(&self, other: &Vote) -> bool {
        self.validator == other.validator
            && self.source == other.source
            && self.target == other.target
    }

    /// Strict containment of intervals: `self.source < other.source` and
    /// `other.target < self.target`. Shared endpoints never count.
    pub fn surrounds(&self, other: &Vote) -> bool {
        self.source.epoch < other.source.epoch && other.target.epoch < self.target.epoch
    }

    /// Classify the conflict between two votes of the same validator, if any.
    pub fn conflict_with(&self, other: &Vote) -> Option<OffenseKind> {
        if self.validator != other.validator {
            return None;
        }

        if self.target.epoch == other.target.epoch {
            return (self.target.block_hash != other.target.block_hash)
                .then_some(OffenseKind::Equivocation);
        }

        if self.surrounds(other) || other.surrounds(self) {
            return Some(OffenseKind::SurroundVote);
        }

        None
    }
}
