//! # Competing Checkpoints
//!
//! Two proposals for the same epoch on different branches. Finalizing one
//! branch makes the other stale for votes and proposals alike.

#[cfg(test)]
mod tests {
    use casper_core::{CasperApi, CasperError, CheckpointProposal, CheckpointState};

    use crate::fixtures::{block, sign_vote, TestNetwork, EPOCH_LENGTH};

    #[tokio::test]
    async fn test_finality_prunes_competing_branch() {
        let net = TestNetwork::new(3);
        let genesis = net.service.last_finalized().await;

        let main = net.checkpoint(0, 1, 1, 0).await;
        let fork = net.checkpoint(1, 1, 11, 0).await;
        assert_eq!(fork.state, CheckpointState::Proposed);

        net.vote(&[0, 1, 2], &genesis, &main).await;
        let next = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&[0, 1, 2], &main, &next).await;

        assert_eq!(net.service.last_finalized().await.block_hash, block(1));
        assert_eq!(
            net.service.checkpoint(block(11)).await.unwrap().state,
            CheckpointState::Stale
        );

        // A stale target is rejected before conflict detection runs
        let late = net.service.vote(sign_vote(net.validator(2), &genesis, &fork)).await;
        assert!(matches!(late, Err(CasperError::StaleCheckpoint { epoch: 1 })));
        let record = net.service.validator(net.validator(2).address()).await.unwrap();
        assert!(!record.slashed);

        // Building on the stale branch
        net.service.on_new_block(3 * EPOCH_LENGTH).await.unwrap();
        let result = net
            .service
            .propose(
                net.validator(1).address(),
                CheckpointProposal {
                    epoch: 3,
                    block_hash: block(13),
                    block_height: 3 * EPOCH_LENGTH,
                    parent_hash: block(11),
                },
            )
            .await;
        assert!(matches!(result, Err(CasperError::UnknownParent { .. })));
    }

    #[tokio::test]
    async fn test_split_vote_blocks_justification() {
        let net = TestNetwork::new(4);
        let genesis = net.service.last_finalized().await;
        let left = net.checkpoint(0, 1, 1, 0).await;
        let right = net.checkpoint(1, 1, 2, 0).await;

        net.vote(&[0, 1], &genesis, &left).await;
        net.vote(&[2, 3], &genesis, &right).await;

        assert!(!net.service.checkpoint(block(1)).await.unwrap().is_justified());
        assert!(!net.service.checkpoint(block(2)).await.unwrap().is_justified());
        assert_eq!(net.service.last_justified().await.epoch, 0);
        assert!(net.service.slashing_evidence().await.is_empty());
    }

    #[tokio::test]
    async fn test_proposals_behind_finality_rejected() {
        let net = TestNetwork::new(3);
        let genesis = net.service.last_finalized().await;
        let a = net.checkpoint(0, 1, 1, 0).await;
        net.vote(&[0, 1, 2], &genesis, &a).await;
        let b = net.checkpoint(0, 2, 2, 1).await;
        net.vote(&[0, 1, 2], &a, &b).await;

        let result = net
            .service
            .propose(
                net.validator(2).address(),
                CheckpointProposal {
                    epoch: 1,
                    block_hash: block(21),
                    block_height: EPOCH_LENGTH,
                    parent_hash: block(0),
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(CasperError::StaleEpoch { epoch: 1, finalized_epoch: 1 })
        ));

        // Same proposer, same epoch, still open
        net.service.on_new_block(3 * EPOCH_LENGTH).await.unwrap();
        net.checkpoint(2, 3, 3, 2).await;
        let result = net
            .service
            .propose(
                net.validator(2).address(),
                CheckpointProposal {
                    epoch: 3,
                    block_hash: block(33),
                    block_height: 3 * EPOCH_LENGTH,
                    parent_hash: block(2),
                },
            )
            .await;
        assert!(matches!(result, Err(CasperError::DuplicateEpoch { epoch: 3, .. })));
    }
}
