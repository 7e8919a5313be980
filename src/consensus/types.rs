use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Id of an acceptor
pub type Id = u64;

/// Ballot number, ordering competing proposals. A proposer's own ballots are
/// strictly increasing across its retries, but ballots are not globally unique
/// across independent proposers.
pub type Ballot = u64;

/// A value that can be proposed and decided. Equality is the only capability
/// the protocol needs of it; values are never hashed or ordered.
pub trait Value: Clone + Eq + Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Debug + Send + Sync + 'static> Value for T {}

/// Number of votes that decide, out of `num_acceptors` voting members.
pub fn quorum(num_acceptors: usize) -> usize {
    num_acceptors / 2 + 1
}

/// A ballot number paired with the value it proposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal<V> {
    pub number: Ballot,
    pub value: V,
}

impl<V> Proposal<V> {
    pub fn new(number: Ballot, value: V) -> Self {
        Proposal { number, value }
    }
}

/// An acceptor's granted response to `prepare`, optionally carrying the
/// proposal the acceptor had already accepted at the time of the response.
/// A rejection is the absence of a promise, not a promise variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise<V> {
    accepted: Option<Proposal<V>>,
}

impl<V> Promise<V> {
    pub fn with_proposal(proposal: Proposal<V>) -> Self {
        Promise {
            accepted: Some(proposal),
        }
    }

    pub fn without_proposal() -> Self {
        Promise { accepted: None }
    }

    /// The previously accepted proposal carried by this promise, if any.
    pub fn accepted(&self) -> Option<&Proposal<V>> {
        self.accepted.as_ref()
    }
}
