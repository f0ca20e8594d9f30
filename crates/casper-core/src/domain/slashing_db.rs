//! # Slashing Detector
//!
//! Remembers every accepted vote per validator and classifies new votes
//! against that history.
//!
//! ## The Two Commandments
//!
//! 1. No Equivocation: never two votes for different blocks at one target epoch
//! 2. No Surround Vote: never a vote whose (source, target) interval strictly
//!    contains, or is strictly contained by, an earlier vote's interval
//!
//! Evidence always carries both signed votes so a third party can re-verify it.

use super::validator::Address;
use super::vote::{OffenseKind, Vote};
use crate::error::{CasperError, CasperResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Two signed votes proving a safety violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashingEvidence {
    /// Same target epoch, different target blocks
    Equivocation {
        validator: Address,
        target_epoch: u64,
        first: Vote,
        second: Vote,
    },
    /// `outer` strictly surrounds `inner`
    SurroundVote {
        validator: Address,
        outer: Vote,
        inner: Vote,
    },
}

impl SlashingEvidence {
    pub fn validator(&self) -> Address {
        match self {
            Self::Equivocation { validator, .. } => *validator,
            Self::SurroundVote { validator, .. } => *validator,
        }
    }

    pub fn kind(&self) -> OffenseKind {
        match self {
            Self::Equivocation { .. } => OffenseKind::Equivocation,
            Self::SurroundVote { .. } => OffenseKind::SurroundVote,
        }
    }

    /// Both votes, in evidence order
    pub fn votes(&self) -> (&Vote, &Vote) {
        match self {
            Self::Equivocation { first, second, .. } => (first, second),
            Self::SurroundVote { outer, inner, .. } => (outer, inner),
        }
    }

    /// Map to the error returned to the submitter of the offending vote
    pub fn to_error(&self) -> CasperError {
        match self {
            Self::Equivocation {
                validator,
                target_epoch,
                ..
            } => CasperError::EquivocationDetected {
                validator: *validator,
                target_epoch: *target_epoch,
            },
            Self::SurroundVote { validator, .. } => CasperError::SurroundVoteDetected {
                validator: *validator,
            },
        }
    }
}

/// Classification of an incoming vote
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetectorOutcome {
    /// No conflict with history
    Fresh,
    /// Already recorded for this target epoch
    Duplicate,
    /// Conflicts with an earlier vote
    Offense(SlashingEvidence),
}

/// Per-validator vote history.
#[derive(Clone, Debug, Default)]
pub struct SlashingDetector {
    /// (validator, target epoch) -> accepted vote
    by_target: HashMap<(Address, u64), Vote>,
    /// Accepted votes in arrival order
    history: HashMap<Address, Vec<Vote>>,
    /// Every offense seen so far
    evidence: Vec<SlashingEvidence>,
}

impl SlashingDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a vote against the validator's history. Does not record it.
    ///
    /// An offense against any recorded vote wins over `Duplicate`: a vote
    /// that repeats one target epoch can still surround another interval.
    pub fn check(&self, vote: &Vote) -> DetectorOutcome {
        let existing = self.by_target.get(&(vote.validator, vote.target.epoch));
        if let Some(existing) = existing.filter(|e| !e.same_link(vote)) {
            if let Ok(evidence) = Self::evaluate_pair(existing, vote) {
                return DetectorOutcome::Offense(evidence);
            }
        }

        let offense = self
            .history
            .get(&vote.validator)
            .into_iter()
            .flatten()
            .find_map(|earlier| Self::evaluate_pair(earlier, vote).ok());

        match (offense, existing) {
            (Some(evidence), _) => DetectorOutcome::Offense(evidence),
            (None, Some(_)) => DetectorOutcome::Duplicate,
            (None, None) => DetectorOutcome::Fresh,
        }
    }

    /// Remember an accepted vote.
    pub fn record(&mut self, vote: Vote) {
        self.by_target
            .insert((vote.validator, vote.target.epoch), vote.clone());
        self.history.entry(vote.validator).or_default().push(vote);
    }

    /// Log evidence of an offense.
    pub fn record_offense(&mut self, evidence: SlashingEvidence) {
        tracing::warn!(
            "[casper] {} by {:02x?}",
            evidence.kind().as_str(),
            &evidence.validator()[..4]
        );
        self.evidence.push(evidence);
    }

    /// Judge two votes supplied as evidence, in any order.
    pub fn evaluate_pair(a: &Vote, b: &Vote) -> CasperResult<SlashingEvidence> {
        if a.validator != b.validator {
            return Err(CasperError::InvalidEvidence {
                reason: "votes signed by different validators".into(),
            });
        }

        match a.conflict_with(b) {
            Some(OffenseKind::Equivocation) => Ok(SlashingEvidence::Equivocation {
                validator: a.validator,
                target_epoch: a.target.epoch,
                first: a.clone(),
                second: b.clone(),
            }),
            Some(OffenseKind::SurroundVote) => {
                let (outer, inner) = if a.surrounds(b) { (a, b) } else { (b, a) };
                Ok(SlashingEvidence::SurroundVote {
                    validator: a.validator,
                    outer: outer.clone(),
                    inner: inner.clone(),
                })
            }
            None => Err(CasperError::InvalidEvidence {
                reason: "votes do not conflict".into(),
            }),
        }
    }

    /// Accepted vote of a validator at a target epoch
    pub fn vote_at(&self, validator: &Address, target_epoch: u64) -> Option<&Vote> {
        self.by_target.get(&(*validator, target_epoch))
    }

    /// All accepted votes of a validator
    pub fn history(&self, validator: &Address) -> &[Vote] {
        self.history.get(validator).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evidence logged so far
    pub fn evidence(&self) -> &[SlashingEvidence] {
        &self.evidence
    }
}
