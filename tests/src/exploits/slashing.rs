//! # Slashable Offenses
//!
//! Double votes and surround votes, caught on submission or proven later
//! through a challenge.

#[cfg(test)]
mod tests {
    use casper_core::{CasperApi, CasperError, CasperEvent, SlashingEvidence};

    use crate::fixtures::{block, sign_link, sign_vote, TestNetwork, GENESIS_STAKE, INITIAL_BALANCE};

    #[tokio::test]
    async fn test_double_vote_caught_on_submission() {
        let net = TestNetwork::new(3);
        let mut events = net.events.subscribe();
        let offender = net.validator(2);

        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;
        let b = net.checkpoint(1, 1, 2, 0).await;

        net.service.vote(sign_vote(offender, &genesis, &a)).await.unwrap();
        let raw = sign_vote(offender, &genesis, &b).encode().unwrap();
        let result = net.service.push_vote_msg(raw).await;
        assert!(matches!(
            result,
            Err(CasperError::EquivocationDetected { target_epoch: 1, .. })
        ));

        // Confiscation is committed even though the vote was rejected
        let record = net.service.validator(offender.address()).await.unwrap();
        assert!(record.slashed);
        assert_eq!(net.token.locked_of(&offender.address()), 0);
        assert_eq!(net.service.total_locked().await, 2 * GENESIS_STAKE);

        let mut slash = None;
        while let Ok(event) = events.try_recv() {
            if let CasperEvent::Slash { .. } = event {
                slash = Some(event);
            }
        }
        assert_eq!(
            slash,
            Some(CasperEvent::Slash {
                validator: offender.address(),
                confiscated_amount: GENESIS_STAKE,
                challenger: None
            })
        );

        // No way back in and no way out with the stake
        assert!(matches!(
            net.service.deposit(offender.address(), 500).await,
            Err(CasperError::AlreadySlashed { .. })
        ));
        assert!(matches!(
            net.service.request_withdraw(offender.address()).await,
            Err(CasperError::AlreadySlashed { .. })
        ));
        assert!(matches!(
            net.service.withdraw(offender.address()).await,
            Err(CasperError::AlreadySlashed { .. })
        ));
    }

    #[tokio::test]
    async fn test_surround_vote_caught_on_submission() {
        let net = TestNetwork::new(4);
        let offender = net.validator(3);
        let genesis = net.service.last_finalized().await;

        let a = net.checkpoint(0, 1, 1, 0).await;
        net.vote(&[0, 1, 2, 3], &genesis, &a).await;
        let b = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&[0, 1, 2, 3], &a, &b).await;
        let c = net.checkpoint(0, 3, 3, 2).await;

        // (0 → 3) surrounds (1 → 2)
        let result = net.service.vote(sign_vote(offender, &genesis, &c)).await;
        assert!(matches!(
            result,
            Err(CasperError::SurroundVoteDetected { .. })
        ));

        let evidence = net.service.slashing_evidence().await;
        assert_eq!(evidence.len(), 1);
        match &evidence[0] {
            SlashingEvidence::SurroundVote { outer, inner, .. } => {
                assert_eq!((outer.source.epoch, outer.target.epoch), (0, 3));
                assert_eq!((inner.source.epoch, inner.target.epoch), (1, 2));
            }
            other => panic!("expected surround evidence, got {other:?}"),
        }

        // The honest majority still justifies c
        let result = net.vote(&[0, 1, 2], &b, &c).await;
        assert_eq!(result.accepted(), 3);
        assert!(net.service.checkpoint(block(3)).await.unwrap().is_justified());
    }

    #[tokio::test]
    async fn test_offense_after_exit_request_still_slashable() {
        let net = TestNetwork::new(3);
        let offender = net.validator(1);
        let challenger = net.validator(0).address();
        net.service.request_withdraw(offender.address()).await.unwrap();

        // Conflicting votes signed off-chain and reported later
        let a = sign_link(offender, (4, block(4)), (9, block(9)));
        let b = sign_link(offender, (5, block(5)), (6, block(6)));
        let receipt = net.service.challenge(challenger, a, b).await.unwrap();

        assert_eq!(receipt.confiscated, GENESIS_STAKE);
        assert_eq!(receipt.reward, 40);
        assert_eq!(receipt.burned, 960);
        assert_eq!(
            net.token.balance_of(&challenger),
            INITIAL_BALANCE - GENESIS_STAKE + 40
        );
        assert_eq!(net.token.total_supply(), 3 * INITIAL_BALANCE - 960);
        assert!(matches!(
            net.service.withdraw(offender.address()).await,
            Err(CasperError::AlreadySlashed { .. })
        ));
    }

    #[tokio::test]
    async fn test_withdrawn_validator_cannot_vote_unslashably() {
        let net = TestNetwork::with_config(4, |c| c.withdrawal_delay = 1);
        let mut events = net.events.subscribe();
        let leaver = net.validator(3);
        let genesis = net.service.last_finalized().await;

        // Exit takes effect in dynasty 1, but dynasty 0 still votes there
        assert_eq!(net.service.request_withdraw(leaver.address()).await.unwrap(), 1);
        let a = net.checkpoint(0, 1, 1, 0).await;
        net.vote(&[0, 1, 2], &genesis, &a).await;
        let b = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&[0, 1, 2], &a, &b).await;
        assert_eq!(net.service.current_dynasty().await, 1);

        assert_eq!(net.service.withdraw(leaver.address()).await.unwrap(), GENESIS_STAKE);
        assert_eq!(net.token.balance_of(&leaver.address()), INITIAL_BALANCE);

        let c = net.checkpoint(0, 3, 3, 2).await;
        let fork = net.checkpoint(1, 3, 4, 2).await;
        for target in [&c, &fork] {
            assert!(matches!(
                net.service.vote(sign_vote(leaver, &b, target)).await,
                Err(CasperError::NotActiveValidator { dynasty: 1, .. })
            ));
        }
        assert!(net.service.slashing_evidence().await.is_empty());
        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, CasperEvent::Slash { .. }));
        }

        // Justification of c rests on the remaining validators alone
        assert_eq!(net.vote(&[0, 1, 2], &b, &c).await.accepted(), 3);
        assert!(net.service.checkpoint(block(3)).await.unwrap().is_justified());
        assert!(!net.service.checkpoint(block(4)).await.unwrap().is_justified());
    }

    #[tokio::test]
    async fn test_evidence_cannot_be_replayed() {
        let net = TestNetwork::new(3);
        let offender = net.validator(2);
        let a = sign_link(offender, (1, block(1)), (2, block(2))).encode().unwrap();
        let b = sign_link(offender, (1, block(1)), (2, block(7))).encode().unwrap();

        let receipt = net
            .service
            .slash(net.validator(0).address(), a.clone(), b.clone())
            .await
            .unwrap();
        assert!(matches!(receipt.evidence, SlashingEvidence::Equivocation { .. }));

        let again = net.service.slash(net.validator(1).address(), a, b).await;
        assert!(matches!(again, Err(CasperError::AlreadySlashed { .. })));
        assert_eq!(net.service.slashing_evidence().await.len(), 1);
    }

    #[tokio::test]
    async fn test_self_report_earns_nothing() {
        let net = TestNetwork::new(3);
        let offender = net.validator(0);
        let a = sign_link(offender, (1, block(1)), (2, block(2)));
        let b = sign_link(offender, (1, block(1)), (2, block(8)));

        let result = net.service.challenge(offender.address(), a, b).await;
        assert!(matches!(result, Err(CasperError::InvalidEvidence { .. })));
        assert!(!net.service.validator(offender.address()).await.unwrap().slashed);
        assert_eq!(net.token.locked_of(&offender.address()), GENESIS_STAKE);
    }
}
