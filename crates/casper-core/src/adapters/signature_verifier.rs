//! Signature Verification Adapter
//!
//! Implements `VoteVerifier` with secp256k1 public-key recovery over the
//! Keccak-256 vote digest. High-S signatures are rejected (EIP-2), so every
//! vote has exactly one valid encoding.

use crate::domain::{keccak256, Address, Hash, Vote, VoteSignature};
use crate::error::{CasperError, CasperResult};
use crate::ports::outbound::VoteVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use tracing::debug;

/// ECDSA vote verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaVoteVerifier;

impl EcdsaVoteVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl VoteVerifier for EcdsaVoteVerifier {
    fn recover_signer(&self, vote: &Vote) -> CasperResult<Address> {
        recover_address(&vote.signing_hash(), &vote.signature).ok_or_else(|| {
            debug!(
                "[casper] Signature recovery failed for vote by {:02x?}",
                &vote.validator[..4]
            );
            CasperError::InvalidSignature {
                validator: vote.validator,
            }
        })
    }
}

/// Recover the signer's address, or None for any malformed or high-S signature.
pub fn recover_address(message_hash: &Hash, signature: &VoteSignature) -> Option<Address> {
    let recovery_id = parse_recovery_id(signature.v())?;
    let sig = Signature::from_slice(&signature.0[..64]).ok()?;

    // normalize_s returns Some only when s is in the upper half
    if sig.normalize_s().is_some() {
        return None;
    }

    let key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id).ok()?;
    Some(address_of(&key))
}

/// Address = last 20 bytes of Keccak-256 over the uncompressed public key
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 prefix
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Option<RecoveryId> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return None,
    };
    RecoveryId::from_byte(id)
}

/// Signs votes with a validator key.
pub struct VoteSigner {
    key: SigningKey,
    address: Address,
}

impl VoteSigner {
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// Load a key from its 32-byte secret scalar.
    pub fn from_secret(secret: &[u8; 32]) -> CasperResult<Self> {
        let key = SigningKey::from_slice(secret).map_err(|_| CasperError::InvalidConfig {
            reason: "invalid secp256k1 secret key".to_string(),
        })?;
        Ok(Self::new(key))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Fill in the vote's validator and signature.
    pub fn sign(&self, mut vote: Vote) -> CasperResult<Vote> {
        vote.validator = self.address;
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(&vote.signing_hash())
            .map_err(|_| CasperError::InvalidSignature {
                validator: self.address,
            })?;

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = recid.to_byte() + 27;
        vote.signature = VoteSignature(bytes);
        Ok(vote)
    }
}

impl std::fmt::Debug for VoteSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
