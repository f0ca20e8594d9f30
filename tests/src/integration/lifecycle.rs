//! # Validator Lifecycle
//!
//! A newcomer deposits during dynasty 0, becomes a voter two finalizations
//! later, helps justify under both dynasties, then exits and withdraws.

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::timeout;

    use casper_core::{CasperApi, CasperError, CasperEvent, CheckpointState};

    use crate::fixtures::{block, random_signer, sign_vote, TestNetwork, GENESIS_STAKE};

    #[tokio::test]
    async fn test_newcomer_joins_after_two_dynasties() {
        let net = TestNetwork::new(3);
        let newcomer = random_signer();
        net.token.mint(&newcomer.address(), 1_000).unwrap();

        // Deposit at dynasty 0: active from dynasty 2
        let start = net.service.deposit(newcomer.address(), 500).await.unwrap();
        assert_eq!(start, 2);
        assert_eq!(net.service.total_locked().await, 3 * GENESIS_STAKE + 500);

        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;
        net.vote(&net.everyone(), &genesis, &a).await;

        let b = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&net.everyone(), &a, &b).await;
        assert_eq!(net.service.current_dynasty().await, 1);

        // Dynasty 1: the newcomer is not a voter yet
        let c = net.checkpoint(0, 3, 3, 2).await;
        let early = net.service.vote(sign_vote(&newcomer, &b, &c)).await;
        assert!(matches!(early, Err(CasperError::NotActiveValidator { dynasty: 1, .. })));

        net.vote(&net.everyone(), &b, &c).await;
        assert_eq!(net.service.current_dynasty().await, 2);

        // Dynasty 2: current total 3500, previous total 3000
        let d = net.checkpoint(0, 4, 4, 3).await;
        let outcome = net.service.vote(sign_vote(&newcomer, &c, &d)).await.unwrap();
        assert_eq!(outcome.tallies[0].weight, 500);
        assert_eq!(outcome.tallies[1].weight, 0);

        let result = net.vote(&[0], &c, &d).await;
        assert!(result.outcomes[0].as_ref().unwrap().justified.is_none());

        // 2500/3500 current and exactly 2/3 of the previous dynasty
        let result = net.vote(&[1], &c, &d).await;
        let outcome = result.outcomes[0].as_ref().unwrap();
        let justified = outcome.justified.as_ref().unwrap();
        assert_eq!(justified.block_hash, block(4));
        assert_eq!(justified.justified_weight, 2_500);
        assert_eq!(outcome.finalized.len(), 1);
        assert_eq!(outcome.finalized[0].epoch, 3);
        assert_eq!(net.service.current_dynasty().await, 3);
    }

    #[tokio::test]
    async fn test_exit_and_withdraw() {
        let net = TestNetwork::new(4);
        let leaver = net.validator(3).address();

        let end = net.service.request_withdraw(leaver).await.unwrap();
        assert_eq!(end, 2);
        assert!(matches!(
            net.service.deposit(leaver, 500).await,
            Err(CasperError::AlreadyRequested { .. })
        ));

        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;
        net.vote(&[0, 1, 2], &genesis, &a).await;
        let b = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&[0, 1, 2], &a, &b).await;

        assert!(matches!(
            net.service.withdraw(leaver).await,
            Err(CasperError::NotMatured { current: 1, end_dynasty: Some(2) })
        ));

        let c = net.checkpoint(0, 3, 3, 2).await;
        net.vote(&[0, 1, 2], &b, &c).await;
        assert_eq!(net.service.current_dynasty().await, 2);

        let released = net.service.withdraw(leaver).await.unwrap();
        assert_eq!(released, GENESIS_STAKE);
        assert_eq!(net.token.locked_of(&leaver), 0);
        assert_eq!(net.service.total_locked().await, 3 * GENESIS_STAKE);
        assert!(net.service.validator(leaver).await.is_none());
    }

    #[tokio::test]
    async fn test_event_stream_order() {
        let net = TestNetwork::new(3);
        let mut events = net.events.subscribe();

        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;
        net.vote(&[0, 1], &genesis, &a).await;
        let b = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&[0, 1], &a, &b).await;

        let mut names = Vec::new();
        let mut finalize = None;
        while let Ok(Ok(event)) = timeout(Duration::from_millis(50), events.recv()).await {
            names.push(event.name());
            if let CasperEvent::Finalize { .. } = event {
                finalize = Some(event);
            }
        }

        assert_eq!(
            names,
            vec![
                "propose", "vote", "vote", "justify", "propose", "vote", "vote", "justify",
                "finalize"
            ]
        );
        assert_eq!(
            finalize,
            Some(CasperEvent::Finalize {
                checkpoint: block(1),
                epoch: 1,
                new_dynasty: 1
            })
        );
    }

    #[tokio::test]
    async fn test_justify_recovers_late_quorum() {
        let net = TestNetwork::new(3);
        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;

        net.vote(&[0], &genesis, &a).await;
        let outcome = net.service.justify(a.block_hash).await.unwrap();
        assert_eq!(outcome.state, CheckpointState::Proposed);
        assert_eq!(outcome.tallies[0].weight, GENESIS_STAKE);

        net.vote(&[1], &genesis, &a).await;
        let outcome = net.service.justify(a.block_hash).await.unwrap();
        assert_eq!(outcome.state, CheckpointState::Justified);
        assert_eq!(net.service.last_justified().await.block_hash, block(1));
    }

    #[tokio::test]
    async fn test_raw_vote_messages() {
        let net = TestNetwork::new(3);
        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;

        for i in 0..2 {
            let raw = sign_vote(net.validator(i), &genesis, &a).encode().unwrap();
            net.service.push_vote_msg(raw).await.unwrap();
        }
        assert!(net.service.checkpoint(block(1)).await.unwrap().is_justified());

        let oversized = vec![0u8; casper_core::domain::MAX_VOTE_MESSAGE_LEN + 1];
        assert!(matches!(
            net.service.push_vote_msg(oversized).await,
            Err(CasperError::MalformedVote { .. })
        ));
    }
}
