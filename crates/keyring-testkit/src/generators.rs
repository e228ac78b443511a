//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keyring_core::{AccountList, Blake3Hash, Ed25519PublicKey, Keypair, NodeId};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519PublicKey.
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a random Blake3Hash.
pub fn blake3_hash() -> impl Strategy<Value = Blake3Hash> {
    any::<[u8; 32]>().prop_map(Blake3Hash)
}

/// Generate a random NodeId.
pub fn node_id() -> impl Strategy<Value = NodeId> {
    any::<[u8; 32]>().prop_map(NodeId::from_bytes)
}

/// Generate an owner name.
pub fn owner_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(String::from)
}

/// Generate a valid account list with 1 to `max_owners` owners.
pub fn account_list(max_owners: usize) -> impl Strategy<Value = AccountList> {
    prop::collection::btree_map(owner_name(), public_key(), 1..=max_owners.max(1))
        .prop_flat_map(|owners| {
            let n = owners.len() as u32;
            (Just(owners), 1..=n)
        })
        .prop_map(|(owners, threshold)| AccountList { owners, threshold })
}

/// One owner's behaviour in a voting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ballot {
    Approve,
    Reject,
    Abstain,
}

/// Generate a ballot.
pub fn ballot() -> impl Strategy<Value = Ballot> {
    prop_oneof![Just(Ballot::Approve), Just(Ballot::Reject), Just(Ballot::Abstain)]
}

/// A voting round: owners `o1..=on` of a list with `threshold`, and what
/// each of them does, in casting order.
#[derive(Debug, Clone)]
pub struct VotingRound {
    pub threshold: u32,
    pub ballots: Vec<Ballot>,
}

impl VotingRound {
    /// Number of owners.
    pub fn owners(&self) -> u8 {
        self.ballots.len() as u8
    }

    /// Number of approving ballots.
    pub fn approvals(&self) -> usize {
        self.ballots.iter().filter(|b| **b == Ballot::Approve).count()
    }
}

impl Arbitrary for VotingRound {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (1u8..=6)
            .prop_flat_map(|owners| {
                (
                    1..=owners as u32,
                    prop::collection::vec(ballot(), owners as usize),
                )
            })
            .prop_map(|(threshold, ballots)| VotingRound { threshold, ballots })
            .boxed()
    }
}
