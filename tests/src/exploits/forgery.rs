//! # Forged and Malformed Votes
//!
//! Votes whose authorship does not check out must never move a tally or
//! slash the validator they name.

#[cfg(test)]
mod tests {
    use casper_core::{CasperApi, CasperError};

    use crate::fixtures::{block, random_signer, sign_link, sign_vote, TestNetwork, GENESIS_STAKE};

    #[tokio::test]
    async fn test_vote_relabelled_to_another_validator() {
        let net = TestNetwork::new(3);
        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;

        let mut vote = sign_vote(net.validator(0), &genesis, &a);
        vote.validator = net.validator(1).address();
        assert!(matches!(
            net.service.vote(vote).await,
            Err(CasperError::InvalidSignature { .. })
        ));

        // The real author can still vote
        let outcome = net
            .service
            .vote(sign_vote(net.validator(0), &genesis, &a))
            .await
            .unwrap();
        assert_eq!(outcome.tallies[0].weight, GENESIS_STAKE);
    }

    #[tokio::test]
    async fn test_tampered_target_breaks_signature() {
        let net = TestNetwork::new(3);
        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;
        let b = net.checkpoint(1, 1, 2, 0).await;

        let mut vote = sign_vote(net.validator(2), &genesis, &a);
        vote.target.block_hash = b.block_hash;
        assert!(matches!(
            net.service.vote(vote).await,
            Err(CasperError::InvalidSignature { .. })
        ));
        assert!(net.service.slashing_evidence().await.is_empty());
    }

    #[tokio::test]
    async fn test_framing_with_forged_evidence() {
        let net = TestNetwork::new(3);
        let victim = net.validator(1).address();
        let attacker = random_signer();

        // Attacker signs both votes but names the victim
        let mut a = sign_link(&attacker, (1, block(1)), (2, block(2)));
        let mut b = sign_link(&attacker, (1, block(1)), (2, block(3)));
        a.validator = victim;
        b.validator = victim;

        let result = net.service.challenge(attacker.address(), a, b).await;
        assert!(matches!(result, Err(CasperError::InvalidSignature { .. })));
        assert!(!net.service.validator(victim).await.unwrap().slashed);
    }

    #[tokio::test]
    async fn test_garbage_evidence_rejected() {
        let net = TestNetwork::new(3);
        let result = net
            .service
            .slash(net.validator(0).address(), vec![0xFF; 8], Vec::new())
            .await;
        assert!(matches!(result, Err(CasperError::MalformedVote { .. })));
        assert_eq!(net.service.total_locked().await, 3 * GENESIS_STAKE);
    }
}
