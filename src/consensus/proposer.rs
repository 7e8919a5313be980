use crate::consensus::acceptor::Acceptor;
use crate::consensus::types::*;
use derivative::Derivative;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const INITIAL_BALLOT: Ballot = 1;

/// Drives the two-phase protocol against a fixed set of acceptors until a
/// quorum has accepted a value.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Proposer<V: Value> {
    id: Id,
    #[derivative(Debug = "ignore")]
    acceptors: Vec<Arc<dyn Acceptor<V>>>,
    /// The single in-flight proposal, carried across phases, retries and
    /// `propose` calls.
    state: Mutex<Option<Proposal<V>>>,
}

impl<V: Value> Proposer<V> {
    pub fn new(id: Id, acceptors: Vec<Arc<dyn Acceptor<V>>>) -> Self {
        Proposer {
            id,
            acceptors,
            state: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Runs the protocol to completion, returning only once a quorum of
    /// acceptors has accepted a value. The returned value is the one the
    /// quorum accepted, which is not necessarily `value_hint`: if phase 1
    /// reveals a previously accepted proposal, its value is adopted instead.
    /// The hint is also ignored whenever an earlier call already created the
    /// in-flight proposal.
    ///
    /// Retries are unbounded and have no backoff; dueling proposers can in
    /// principle livelock each other indefinitely.
    #[instrument]
    pub fn propose(&self, value_hint: V) -> V {
        // Held for the whole call; a proposer runs one proposal at a time.
        let mut slot = self.state.lock();
        let mut proposal = slot
            .take()
            .unwrap_or_else(|| Proposal::new(INITIAL_BALLOT, value_hint));

        loop {
            self.phase_one(&mut proposal);
            if self.phase_two(&proposal) {
                break;
            }
            // Phase 2 fell short; back to phase 1 with the same ballot. It is
            // only bumped if the next prepare round also misses quorum.
        }

        info!("quorum accepted proposal {:?}", proposal);
        let value = proposal.value.clone();
        *slot = Some(proposal);
        value
    }

    /// Phase 1: broadcast `prepare` until a quorum of acceptors grants a
    /// promise, bumping the ballot after every failed round. On success,
    /// adopts the value of the highest-ballot previously accepted proposal
    /// carried by any promise, keeping the current ballot.
    fn phase_one(&self, proposal: &mut Proposal<V>) {
        loop {
            let promises: Vec<Option<Promise<V>>> = self
                .acceptors
                .iter()
                .map(|acceptor| acceptor.prepare(proposal))
                .collect();

            let granted = promises.iter().filter(|response| response.is_some()).count();
            if granted < quorum(self.acceptors.len()) {
                debug!(
                    "prepare for ballot {} granted by {}/{}, retrying",
                    proposal.number,
                    granted,
                    self.acceptors.len()
                );
                proposal.number += 1;
                continue;
            }

            if let Some(prior) = promises
                .iter()
                .flatten()
                .filter_map(Promise::accepted)
                .max_by_key(|accepted| accepted.number)
            {
                proposal.value = prior.value.clone();
            }
            return;
        }
    }

    /// Phase 2: broadcast `accept`; true iff a quorum accepted the proposal.
    fn phase_two(&self, proposal: &Proposal<V>) -> bool {
        let accepted = self
            .acceptors
            .iter()
            .filter(|acceptor| acceptor.accept(proposal))
            .count();
        accepted >= quorum(self.acceptors.len())
    }
}
