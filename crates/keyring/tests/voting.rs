//! Voting, commit, and ledger interaction on a single node.

use std::time::Duration;

use keyring::core::{AccountList, Blake3Hash, IdentityId};
use keyring::ledger::{verify_history, LedgerError};
use keyring::{CommitPolicy, KeyringError, ServiceConfig};
use keyring_testkit::{account_list, approve, init_tracing, owner, owner_key, Ballot, Cluster, VotingRound};
use proptest::prelude::*;

/// One-node cluster holding an identity owned by `initial`.
async fn single(config: ServiceConfig, initial: AccountList) -> (Cluster, IdentityId) {
    init_tracing();
    let cluster = Cluster::start(1, config).await;
    let reply = cluster
        .node(0)
        .add_identity(cluster.roster(), initial)
        .await
        .unwrap();
    assert!(reply.propagation_failure.is_none());
    (cluster, reply.id)
}

fn every_ballot() -> ServiceConfig {
    ServiceConfig {
        commit_policy: CommitPolicy::EveryBallot,
        ..ServiceConfig::default()
    }
}

#[tokio::test]
async fn test_commit_round_trip() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    let node = cluster.node(0);
    let next = account_list(3, 2);

    node.propose_config(id, next.clone(), None).await.unwrap();
    assert_eq!(node.config_new_check(&id).await.unwrap(), Some(next.clone()));

    assert!(node
        .vote_config(id, "o1", Some(approve(1, &next)))
        .await
        .unwrap()
        .is_none());
    let head = node
        .vote_config(id, "o2", Some(approve(2, &next)))
        .await
        .unwrap()
        .expect("second approval meets the threshold");

    assert_eq!(head.index, 1);
    assert_eq!(head.config, Some(next.clone()));
    assert_eq!(node.config_update(&id).await.unwrap(), next);
    assert_eq!(node.config_new_check(&id).await.unwrap(), None);

    let storage = node.snapshot(&id).await.unwrap();
    assert!(storage.votes.is_empty());
    assert_eq!(storage.data, head);
}

#[tokio::test]
async fn test_committed_history_verifies() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(1, 1)).await;
    let node = cluster.node(0);

    for owners in 2..=3 {
        let next = account_list(owners, 1);
        node.propose_config(id, next.clone(), None).await.unwrap();
        node.vote_config(id, "o1", Some(approve(1, &next)))
            .await
            .unwrap()
            .unwrap();
    }

    let storage = node.snapshot(&id).await.unwrap();
    let history = cluster.ledger.history(&storage.root.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].id.as_bytes(), id.as_bytes());
    assert_eq!(
        verify_history(&storage.root, &history).unwrap(),
        account_list(3, 1)
    );
}

#[tokio::test]
async fn test_duplicate_vote_under_threshold_policy() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    let node = cluster.node(0);
    let next = account_list(3, 2);
    node.propose_config(id, next.clone(), None).await.unwrap();

    node.vote_config(id, "o1", Some(approve(1, &next))).await.unwrap();
    assert!(matches!(
        node.vote_config(id, "o1", None).await,
        Err(KeyringError::DuplicateVote(name)) if name == "o1"
    ));

    // rejection: every owner has now voted, but approvals stay below threshold
    assert!(node.vote_config(id, "o2", None).await.unwrap().is_none());

    assert_eq!(node.config_new_check(&id).await.unwrap(), Some(next));
    assert_eq!(node.config_update(&id).await.unwrap(), account_list(2, 2));
    let root = node.snapshot(&id).await.unwrap().root;
    assert_eq!(cluster.ledger.history(&root.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_vote_under_every_ballot_policy() {
    let (cluster, id) = single(every_ballot(), account_list(2, 2)).await;
    let node = cluster.node(0);
    let next = account_list(3, 2);
    node.propose_config(id, next.clone(), None).await.unwrap();

    let first = node
        .vote_config(id, "o1", Some(approve(1, &next)))
        .await
        .unwrap();
    assert!(first.is_some());
    assert!(matches!(
        node.vote_config(id, "o1", Some(approve(1, &next))).await,
        Err(KeyringError::DuplicateVote(_))
    ));

    // the round stays open, so the rejection commits again
    let second = node.vote_config(id, "o2", None).await.unwrap().unwrap();
    assert_eq!(second.index, 2);

    let storage = node.snapshot(&id).await.unwrap();
    assert_eq!(storage.latest, next);
    assert_eq!(storage.proposed, Some(next));
    assert_eq!(storage.votes.len(), 2);
    assert_eq!(cluster.ledger.history(&storage.root.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_signer_rejected() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    let node = cluster.node(0);
    let next = account_list(3, 2);
    node.propose_config(id, next.clone(), None).await.unwrap();

    assert!(matches!(
        node.vote_config(id, "mallory", None).await,
        Err(KeyringError::UnknownSigner(_))
    ));

    // o3 only becomes an owner once the proposal commits
    assert!(matches!(
        node.vote_config(id, "o3", Some(approve(3, &next))).await,
        Err(KeyringError::UnknownSigner(_))
    ));
    assert!(node.snapshot(&id).await.unwrap().votes.is_empty());
}

#[tokio::test]
async fn test_vote_without_proposal() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    assert!(matches!(
        cluster.node(0).vote_config(id, "o1", None).await,
        Err(KeyringError::NoProposal(_))
    ));
}

#[tokio::test]
async fn test_invalid_signature_rejected() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    let node = cluster.node(0);
    let next = account_list(3, 2);
    node.propose_config(id, next.clone(), None).await.unwrap();

    // o1's signature presented as o2's ballot
    assert!(matches!(
        node.vote_config(id, "o2", Some(approve(1, &next))).await,
        Err(KeyringError::InvalidSignature(name)) if name == "o2"
    ));
    // o2's signature over a different list
    assert!(matches!(
        node.vote_config(id, "o2", Some(approve(2, &account_list(2, 1)))).await,
        Err(KeyringError::InvalidSignature(_))
    ));
    // signature over raw bytes instead of the list hash
    let raw = owner_key(2).sign(b"approve");
    assert!(matches!(
        node.vote_config(id, "o2", Some(raw)).await,
        Err(KeyringError::InvalidSignature(_))
    ));

    assert!(!node.snapshot(&id).await.unwrap().has_voted("o2"));
}

#[tokio::test]
async fn test_new_proposal_resets_ballots() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    let node = cluster.node(0);
    let first = account_list(3, 2);
    node.propose_config(id, first.clone(), None).await.unwrap();
    node.vote_config(id, "o1", Some(approve(1, &first))).await.unwrap();

    let second = account_list(3, 3);
    node.propose_config(id, second.clone(), None).await.unwrap();
    assert!(node.snapshot(&id).await.unwrap().votes.is_empty());

    // the same owner may vote again on the new proposal
    node.vote_config(id, "o1", Some(approve(1, &second)))
        .await
        .unwrap();
    assert!(node.snapshot(&id).await.unwrap().has_voted("o1"));
}

#[tokio::test]
async fn test_invalid_proposal_rejected() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(2, 2)).await;
    let node = cluster.node(0);

    assert!(matches!(
        node.propose_config(id, account_list(2, 0), None).await,
        Err(KeyringError::InvalidConfig(_))
    ));
    assert!(matches!(
        node.propose_config(id, AccountList::new(1), None).await,
        Err(KeyringError::InvalidConfig(_))
    ));
    assert_eq!(node.config_new_check(&id).await.unwrap(), None);
}

#[tokio::test]
async fn test_stale_proposal_rejected() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(1, 1)).await;
    let node = cluster.node(0);
    let base = node.config_update(&id).await.unwrap().hash();

    let next = account_list(2, 1);
    node.propose_config(id, next.clone(), Some(base)).await.unwrap();
    node.vote_config(id, "o1", Some(approve(1, &next)))
        .await
        .unwrap()
        .unwrap();

    // built against the list that was just replaced
    let err = node
        .propose_config(id, account_list(3, 1), Some(base))
        .await
        .unwrap_err();
    assert!(matches!(err, KeyringError::StaleProposal { latest, .. } if latest == next.hash()));

    node.propose_config(id, account_list(3, 1), Some(next.hash()))
        .await
        .unwrap();
    assert!(node
        .propose_config(id, account_list(3, 2), Some(Blake3Hash([7; 32])))
        .await
        .is_err());
}

#[tokio::test]
async fn test_ledger_failure_rolls_back_ballot() {
    let (cluster, id) = single(ServiceConfig::default(), account_list(1, 1)).await;
    let node = cluster.node(0);
    let next = account_list(2, 1);
    node.propose_config(id, next.clone(), None).await.unwrap();

    cluster.ledger.set_available(false);
    assert!(matches!(
        node.vote_config(id, "o1", Some(approve(1, &next))).await,
        Err(KeyringError::LedgerUnavailable(LedgerError::Unavailable(_)))
    ));
    let storage = node.snapshot(&id).await.unwrap();
    assert!(!storage.has_voted("o1"));
    assert_eq!(storage.latest, account_list(1, 1));
    assert_eq!(storage.proposed, Some(next.clone()));

    cluster.ledger.set_available(true);
    let head = node
        .vote_config(id, "o1", Some(approve(1, &next)))
        .await
        .unwrap();
    assert!(head.is_some());
    assert_eq!(node.config_update(&id).await.unwrap(), next);
}

#[tokio::test]
async fn test_ledger_timeout_is_unavailable() {
    let config = ServiceConfig {
        ledger_timeout_ms: 50,
        ..ServiceConfig::default()
    };
    let (cluster, id) = single(config, account_list(1, 1)).await;
    let node = cluster.node(0);
    let next = account_list(2, 1);
    node.propose_config(id, next.clone(), None).await.unwrap();

    cluster.ledger.set_delay(Duration::from_millis(500));
    let err = node
        .vote_config(id, "o1", Some(approve(1, &next)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
    assert!(!node.snapshot(&id).await.unwrap().has_voted("o1"));
}

#[tokio::test]
async fn test_add_identity_rejects_invalid_config() {
    init_tracing();
    let cluster = Cluster::start(1, ServiceConfig::default()).await;
    let err = cluster
        .node(0)
        .add_identity(cluster.roster(), account_list(2, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, KeyringError::InvalidConfig(_)));
    assert!(cluster.node(0).identities().await.is_empty());
    assert_eq!(cluster.ledger.block_count().await, 0);
}

#[tokio::test]
async fn test_unknown_identity() {
    init_tracing();
    let cluster = Cluster::start(1, ServiceConfig::default()).await;
    let id = IdentityId::from_bytes([4; 32]);
    assert!(matches!(
        cluster.node(0).config_update(&id).await,
        Err(KeyringError::IdentityNotFound(_))
    ));
    assert!(matches!(
        cluster.node(0).propose_config(id, account_list(1, 1), None).await,
        Err(KeyringError::IdentityNotFound(_))
    ));
}

#[tokio::test]
async fn test_identities_are_distinct() {
    init_tracing();
    let cluster = Cluster::start(1, ServiceConfig::default()).await;
    let node = cluster.node(0);
    let a = node.add_identity(cluster.roster(), account_list(1, 1)).await.unwrap();
    let b = node.add_identity(cluster.roster(), account_list(1, 1)).await.unwrap();

    assert_ne!(a.id, b.id);
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(node.identities().await, expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Under the threshold policy the round commits exactly when approvals
    /// reach the threshold, and closes behind it.
    #[test]
    fn commit_happens_at_threshold(round: VotingRound) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let initial = account_list(round.owners(), round.threshold);
            let (cluster, id) = single(ServiceConfig::default(), initial).await;
            let node = cluster.node(0);
            let next = account_list(round.owners(), 1);
            node.propose_config(id, next.clone(), None).await.unwrap();

            let mut approvals = 0;
            let mut committed = false;
            for (i, ballot) in round.ballots.iter().enumerate() {
                let who = i as u8 + 1;
                let signature = match ballot {
                    Ballot::Approve => Some(approve(who, &next)),
                    Ballot::Reject => None,
                    Ballot::Abstain => continue,
                };
                let result = node.vote_config(id, &owner(who), signature).await;
                if committed {
                    prop_assert!(matches!(result, Err(KeyringError::NoProposal(_))));
                    continue;
                }
                if *ballot == Ballot::Approve {
                    approvals += 1;
                }
                let head = result.unwrap();
                prop_assert_eq!(head.is_some(), approvals >= round.threshold as usize);
                committed = head.is_some();
            }

            prop_assert_eq!(committed, round.approvals() >= round.threshold as usize);
            let storage = node.snapshot(&id).await.unwrap();
            let history = cluster.ledger.history(&storage.root.id).await.unwrap();
            prop_assert_eq!(history.len(), if committed { 2 } else { 1 });
            Ok(())
        })?;
    }
}
