//! # Test Fixtures
//!
//! A small network of funded validators with secp256k1 keys, wired to the
//! in-memory token ledger and a broadcast publisher.

use std::sync::Arc;

use casper_core::adapters::{
    BroadcastEventPublisher, EcdsaVoteVerifier, InMemoryTokenLedger, VoteSigner,
};
use casper_core::{
    BatchVoteResult, CasperApi, CasperConfig, CasperService, Checkpoint, CheckpointProposal,
    CheckpointRef, GenesisValidator, Hash, Vote, VoteSignature,
};
use k256::ecdsa::SigningKey;

pub const EPOCH_LENGTH: u64 = 10;
pub const GENESIS_STAKE: u128 = 1_000;
pub const MIN_DEPOSIT: u128 = 100;
pub const INITIAL_BALANCE: u128 = 10_000;

pub type TestService = CasperService<InMemoryTokenLedger, EcdsaVoteVerifier, BroadcastEventPublisher>;

/// Deterministic block hash for tests
pub fn block(n: u8) -> Hash {
    [n; 32]
}

/// Fresh random signer
pub fn random_signer() -> VoteSigner {
    VoteSigner::new(SigningKey::random(&mut rand::thread_rng()))
}

/// Sign a vote for `source → target`
pub fn sign_vote(signer: &VoteSigner, source: &Checkpoint, target: &Checkpoint) -> Vote {
    sign_link(
        signer,
        (source.epoch, source.block_hash),
        (target.epoch, target.block_hash),
    )
}

/// Sign a vote for raw (epoch, hash) pairs that need not exist
pub fn sign_link(signer: &VoteSigner, source: (u64, Hash), target: (u64, Hash)) -> Vote {
    let unsigned = Vote::new(
        [0; 20],
        CheckpointRef::new(source.0, source.1),
        CheckpointRef::new(target.0, target.1),
        VoteSignature::default(),
    );
    signer.sign(unsigned).expect("signing with a valid key")
}

/// Install a test subscriber once; RUST_LOG controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestNetwork {
    pub service: Arc<TestService>,
    pub token: Arc<InMemoryTokenLedger>,
    pub events: Arc<BroadcastEventPublisher>,
    pub validators: Vec<VoteSigner>,
}

impl TestNetwork {
    /// `count` genesis validators with `GENESIS_STAKE` each
    pub fn new(count: usize) -> Self {
        Self::with_config(count, |_| {})
    }

    pub fn with_config(count: usize, customize: impl FnOnce(&mut CasperConfig)) -> Self {
        init_tracing();

        let validators: Vec<_> = (0..count).map(|_| random_signer()).collect();
        let token = Arc::new(InMemoryTokenLedger::default());
        for v in &validators {
            token
                .mint(&v.address(), INITIAL_BALANCE)
                .expect("mint test balance");
        }

        let mut config = CasperConfig {
            min_deposit: MIN_DEPOSIT,
            epoch_length: EPOCH_LENGTH,
            withdrawal_delay: 2,
            genesis_hash: block(0),
            genesis_validators: validators
                .iter()
                .map(|v| GenesisValidator {
                    address: v.address(),
                    stake: GENESIS_STAKE,
                })
                .collect(),
            ..CasperConfig::default()
        };
        customize(&mut config);

        let events = Arc::new(BroadcastEventPublisher::new(config.event_channel_capacity));
        let service = CasperService::new(
            config,
            token.clone(),
            Arc::new(EcdsaVoteVerifier::new()),
            events.clone(),
        )
        .expect("valid test configuration");

        Self {
            service: Arc::new(service),
            token,
            events,
            validators,
        }
    }

    pub fn validator(&self, i: usize) -> &VoteSigner {
        &self.validators[i]
    }

    /// Advance the head to the epoch boundary and propose a checkpoint there.
    pub async fn checkpoint(&self, proposer: usize, epoch: u64, hash: u8, parent: u8) -> Checkpoint {
        let height = epoch * EPOCH_LENGTH;
        if self.service.current_epoch().await < epoch {
            self.service
                .on_new_block(height)
                .await
                .expect("head moves forward");
        }
        self.service
            .propose(
                self.validators[proposer].address(),
                CheckpointProposal {
                    epoch,
                    block_hash: block(hash),
                    block_height: height,
                    parent_hash: block(parent),
                },
            )
            .await
            .expect("valid proposal")
    }

    /// Submit votes from the given validators as one batch.
    pub async fn vote(
        &self,
        voters: &[usize],
        source: &Checkpoint,
        target: &Checkpoint,
    ) -> BatchVoteResult {
        let votes = voters
            .iter()
            .map(|&i| sign_vote(&self.validators[i], source, target))
            .collect();
        self.service.batch_vote(votes).await
    }

    /// Indices of every genesis validator
    pub fn everyone(&self) -> Vec<usize> {
        (0..self.validators.len()).collect()
    }
}
