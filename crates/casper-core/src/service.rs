//! Casper Service - contract surface over the domain
//!
//! Every operation takes the state write lock for its whole duration. Within
//! the lock the order is always: validate, call the token ledger, mutate
//! state, publish events. A failure before the mutation leaves nothing
//! behind.

use crate::domain::{
    Address, Checkpoint, CheckpointProposal, Hash, SlashingDetector, SlashingEvidence,
    ValidatorRecord, Vote,
};
use crate::error::{CasperError, CasperResult};
use crate::events::{CasperEvent, ChallengeEvidence};
use crate::metrics;
use crate::ports::inbound::{BatchVoteResult, CasperApi, JustifyOutcome, SlashReceipt, VoteOutcome};
use crate::ports::outbound::{EventPublisher, TokenLedger, VoteVerifier};
use crate::state::{AppliedVote, CasperState, VoteCheck};
use crate::types::CasperConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Casper staking and finality service
pub struct CasperService<T, V, P>
where
    T: TokenLedger,
    V: VoteVerifier,
    P: EventPublisher,
{
    config: CasperConfig,
    state: Arc<RwLock<CasperState>>,
    token: Arc<T>,
    verifier: Arc<V>,
    publisher: Arc<P>,
}

impl<T, V, P> CasperService<T, V, P>
where
    T: TokenLedger,
    V: VoteVerifier,
    P: EventPublisher,
{
    /// Create the service and lock the genesis validators' stake.
    pub fn new(
        config: CasperConfig,
        token: Arc<T>,
        verifier: Arc<V>,
        publisher: Arc<P>,
    ) -> CasperResult<Self> {
        config.validate()?;

        for (i, v) in config.genesis_validators.iter().enumerate() {
            if let Err(e) = token.lock(&v.address, v.stake) {
                // Undo the locks already taken
                for prev in &config.genesis_validators[..i] {
                    if let Err(undo) = token.unlock(&prev.address, prev.stake) {
                        warn!("[casper] Failed to release genesis stake: {}", undo);
                    }
                }
                return Err(e);
            }
        }

        let state = CasperState::new(&config);
        metrics::set_locked_stake(state.ledger.total_locked());

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(state)),
            token,
            verifier,
            publisher,
        })
    }

    pub fn config(&self) -> &CasperConfig {
        &self.config
    }

    /// Log and count a rejected call.
    fn observe<R>(operation: &str, result: CasperResult<R>) -> CasperResult<R> {
        if let Err(e) = &result {
            if e.is_slashing() {
                warn!("[casper] {} slashed its author: {}", operation, e);
            } else {
                debug!("[casper] {} rejected: {}", operation, e);
            }
            metrics::record_rejected(e.kind());
        }
        result
    }

    /// Signature check shared by votes and challenge evidence
    fn verify_author(&self, vote: &Vote) -> CasperResult<()> {
        let signer = self.verifier.recover_signer(vote)?;
        if signer != vote.validator {
            return Err(CasperError::InvalidSignature {
                validator: vote.validator,
            });
        }
        Ok(())
    }

    /// Verify, check and count one vote under the write lock.
    fn process_vote(&self, state: &mut CasperState, vote: Vote) -> CasperResult<VoteOutcome> {
        self.verify_author(&vote)?;

        match state.check_vote(&vote)? {
            VoteCheck::Offense(evidence) => {
                let error = evidence.to_error();
                self.slash_offender(state, evidence, None)?;
                Err(error)
            }
            VoteCheck::Accept(link) => {
                let event = CasperEvent::Vote {
                    validator: vote.validator,
                    source_epoch: vote.source.epoch,
                    target_epoch: vote.target.epoch,
                    target_checkpoint: vote.target.block_hash,
                };
                let applied = state.apply_vote(vote, link)?;
                self.publisher.publish(event);
                metrics::record_vote_accepted();
                Ok(self.publish_finality(applied))
            }
        }
    }

    /// Emit Justify/Finalize events for an applied change.
    fn publish_finality(&self, applied: AppliedVote) -> VoteOutcome {
        if let Some(cp) = &applied.justified {
            self.publisher.publish(CasperEvent::Justify {
                checkpoint: cp.block_hash,
                epoch: cp.epoch,
                total_stake_weight: cp.justified_weight,
            });
            metrics::record_checkpoint_justified();
        }

        let mut finalized = Vec::with_capacity(applied.finalized.len());
        for f in applied.finalized {
            self.publisher.publish(CasperEvent::Finalize {
                checkpoint: f.checkpoint.block_hash,
                epoch: f.checkpoint.epoch,
                new_dynasty: f.new_dynasty,
            });
            metrics::record_checkpoint_finalized(f.new_dynasty);
            finalized.push(f.checkpoint);
        }

        VoteOutcome {
            tallies: applied.tally.tallies,
            justified: applied.justified,
            finalized,
        }
    }

    /// Confiscate the offender's stake. A challenger receives the configured
    /// share; the remainder is burned.
    fn slash_offender(
        &self,
        state: &mut CasperState,
        evidence: SlashingEvidence,
        challenger: Option<Address>,
    ) -> CasperResult<SlashReceipt> {
        let validator = evidence.validator();
        let confiscated = state.check_slash(&evidence)?;
        let reward = challenger.map_or(0, |_| self.config.challenger_reward(confiscated));
        let burned = confiscated - reward;

        let payout = challenger.filter(|_| reward > 0).map(|c| (c, reward));
        self.token.confiscate_locked(&validator, confiscated, payout)?;

        let kind = evidence.kind();
        state.apply_slash(evidence.clone())?;

        info!(
            "[casper] Slashed {:02x?} for {}: {} confiscated, {} rewarded",
            &validator[..4],
            kind.as_str(),
            confiscated,
            reward
        );
        self.publisher.publish(CasperEvent::Slash {
            validator,
            confiscated_amount: confiscated,
            challenger,
        });
        metrics::record_slashing(kind.as_str());
        metrics::set_locked_stake(state.ledger.total_locked());

        Ok(SlashReceipt {
            validator,
            confiscated,
            reward,
            burned,
            evidence,
        })
    }

    fn deposit_inner(&self, validator: Address, amount: u128) -> CasperResult<u64> {
        let mut state = self.state.write();
        state.ledger.check_deposit(&validator, amount)?;
        self.token.lock(&validator, amount)?;

        let dynasty = state.dynasties.current();
        let start_dynasty = state.ledger.deposit(validator, amount, dynasty)?.start_dynasty;

        info!(
            "[casper] Deposit of {} by {:02x?}, active from dynasty {}",
            amount,
            &validator[..4],
            start_dynasty
        );
        self.publisher.publish(CasperEvent::Deposit {
            validator,
            amount,
            start_dynasty,
        });
        metrics::record_deposit();
        metrics::set_locked_stake(state.ledger.total_locked());
        Ok(start_dynasty)
    }

    fn request_withdraw_inner(&self, validator: Address) -> CasperResult<u64> {
        let mut state = self.state.write();
        let dynasty = state.dynasties.current();
        let head = state.head_height;
        let end_dynasty = state.ledger.request_withdraw(&validator, dynasty, head)?;

        info!(
            "[casper] Withdrawal requested by {:02x?}, matures at dynasty {}",
            &validator[..4],
            end_dynasty
        );
        self.publisher.publish(CasperEvent::WithdrawRequested {
            validator,
            end_dynasty,
        });
        Ok(end_dynasty)
    }

    fn withdraw_inner(&self, validator: Address) -> CasperResult<u128> {
        let mut state = self.state.write();
        let dynasty = state.dynasties.current();
        let amount = state.ledger.check_withdraw(&validator, dynasty)?;
        self.token.unlock(&validator, amount)?;
        state.ledger.withdraw(&validator, dynasty)?;

        info!("[casper] Withdrew {} to {:02x?}", amount, &validator[..4]);
        self.publisher
            .publish(CasperEvent::Withdraw { validator, amount });
        metrics::record_withdrawal();
        metrics::set_locked_stake(state.ledger.total_locked());
        Ok(amount)
    }

    fn propose_inner(
        &self,
        proposer: Address,
        proposal: CheckpointProposal,
    ) -> CasperResult<Checkpoint> {
        let mut state = self.state.write();
        state.check_proposal(&proposer, &proposal)?;
        let index = state.gadget.propose(proposer, &proposal)?;
        let checkpoint = state.gadget.tree()[index].clone();

        debug!(
            "[casper] Checkpoint proposed for epoch {} at height {}",
            checkpoint.epoch, checkpoint.block_height
        );
        self.publisher.publish(CasperEvent::Propose {
            checkpoint: checkpoint.block_hash,
            epoch: checkpoint.epoch,
            parent: proposal.parent_hash,
        });
        Ok(checkpoint)
    }

    fn justify_inner(&self, block_hash: Hash) -> CasperResult<JustifyOutcome> {
        let mut state = self.state.write();
        let index = state
            .checkpoint(&block_hash)
            .ok_or(CasperError::UnknownCheckpoint { block_hash })?
            .index;

        let outcome = self.publish_finality(state.reevaluate(index));
        let checkpoint = state.gadget.tree()[index].clone();
        Ok(JustifyOutcome {
            state: checkpoint.state,
            checkpoint,
            tallies: outcome.tallies,
            finalized: outcome.finalized,
        })
    }

    fn challenge_inner(&self, evidence: ChallengeEvidence) -> CasperResult<SlashReceipt> {
        let ChallengeEvidence {
            challenger,
            vote_a,
            vote_b,
        } = evidence;

        self.verify_author(&vote_a)?;
        self.verify_author(&vote_b)?;
        let evidence = SlashingDetector::evaluate_pair(&vote_a, &vote_b)?;
        if evidence.validator() == challenger {
            return Err(CasperError::InvalidEvidence {
                reason: "validator cannot challenge itself".into(),
            });
        }

        let mut state = self.state.write();
        self.slash_offender(&mut state, evidence, Some(challenger))
    }

    fn vote_inner(&self, vote: Vote) -> CasperResult<VoteOutcome> {
        let mut state = self.state.write();
        self.process_vote(&mut state, vote)
    }
}

#[async_trait]
impl<T, V, P> CasperApi for CasperService<T, V, P>
where
    T: TokenLedger + 'static,
    V: VoteVerifier + 'static,
    P: EventPublisher + 'static,
{
    async fn deposit(&self, validator: Address, amount: u128) -> CasperResult<u64> {
        Self::observe("deposit", self.deposit_inner(validator, amount))
    }

    async fn request_withdraw(&self, validator: Address) -> CasperResult<u64> {
        Self::observe("request_withdraw", self.request_withdraw_inner(validator))
    }

    async fn withdraw(&self, validator: Address) -> CasperResult<u128> {
        Self::observe("withdraw", self.withdraw_inner(validator))
    }

    async fn propose(
        &self,
        proposer: Address,
        proposal: CheckpointProposal,
    ) -> CasperResult<Checkpoint> {
        Self::observe("propose", self.propose_inner(proposer, proposal))
    }

    async fn vote(&self, vote: Vote) -> CasperResult<VoteOutcome> {
        Self::observe("vote", self.vote_inner(vote))
    }

    async fn push_vote_msg(&self, raw: Vec<u8>) -> CasperResult<VoteOutcome> {
        let result = Vote::decode(&raw).and_then(|vote| self.vote_inner(vote));
        Self::observe("push_vote_msg", result)
    }

    async fn batch_vote(&self, votes: Vec<Vote>) -> BatchVoteResult {
        let mut state = self.state.write();
        let outcomes: Vec<_> = votes
            .into_iter()
            .map(|vote| Self::observe("batch_vote", self.process_vote(&mut state, vote)))
            .collect();

        let result = BatchVoteResult { outcomes };
        debug!(
            "[casper] Batch processed: {} accepted, {} rejected",
            result.accepted(),
            result.rejected()
        );
        result
    }

    async fn challenge(
        &self,
        challenger: Address,
        vote_a: Vote,
        vote_b: Vote,
    ) -> CasperResult<SlashReceipt> {
        let evidence = ChallengeEvidence::new(challenger, vote_a, vote_b);
        Self::observe("challenge", self.challenge_inner(evidence))
    }

    async fn slash(
        &self,
        challenger: Address,
        raw_a: Vec<u8>,
        raw_b: Vec<u8>,
    ) -> CasperResult<SlashReceipt> {
        let result = ChallengeEvidence::from_raw(challenger, &raw_a, &raw_b)
            .and_then(|evidence| self.challenge_inner(evidence));
        Self::observe("slash", result)
    }

    async fn justify(&self, block_hash: Hash) -> CasperResult<JustifyOutcome> {
        Self::observe("justify", self.justify_inner(block_hash))
    }

    async fn on_new_block(&self, height: u64) -> CasperResult<()> {
        Self::observe("on_new_block", self.state.write().advance_head(height))
    }

    async fn current_dynasty(&self) -> u64 {
        self.state.read().dynasties.current()
    }

    async fn current_epoch(&self) -> u64 {
        self.state.read().current_epoch()
    }

    async fn validator(&self, address: Address) -> Option<ValidatorRecord> {
        self.state.read().ledger.get(&address).cloned()
    }

    async fn checkpoint(&self, block_hash: Hash) -> Option<Checkpoint> {
        self.state.read().checkpoint(&block_hash).cloned()
    }

    async fn last_justified(&self) -> Checkpoint {
        self.state.read().gadget.last_justified().clone()
    }

    async fn last_finalized(&self) -> Checkpoint {
        self.state.read().gadget.last_finalized().clone()
    }

    async fn total_locked(&self) -> u128 {
        self.state.read().ledger.total_locked()
    }

    async fn slashing_evidence(&self) -> Vec<SlashingEvidence> {
        self.state.read().detector.evidence().to_vec()
    }
}
