use crate::consensus::types::*;
use derivative::Derivative;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Aggregates acceptance notifications and detects when a majority of
/// acceptors has converged on one value.
pub trait Learner<V: Value>: Send + Sync {
    /// Notification that `acceptor_id` accepted `proposal`. Fire-and-forget;
    /// duplicate and stale (equal-or-lower ballot) deliveries are ignored.
    fn teach(&self, acceptor_id: Id, proposal: Proposal<V>);

    /// Blocks the calling thread until a majority value is known, then
    /// returns it. There is no timeout; callers needing bounded waits must
    /// wrap this externally.
    fn get_value(&self) -> V;
}

#[derive(Debug)]
struct LearnerState<V> {
    /// Latest proposal taught by each acceptor id, keyed by id. Entries are
    /// overwritten only by a strictly greater ballot.
    taught: HashMap<Id, Proposal<V>>,
    consensus: Option<V>,
}

/// In-process learner for a fixed-size group of `num_acceptors` voting
/// members, which may exceed the number of distinct ids ever taught.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct LocalLearner<V: Value> {
    num_acceptors: usize,
    state: Mutex<LearnerState<V>>,
    #[derivative(Debug = "ignore")]
    consensus_reached: Condvar,
}

impl<V: Value> LocalLearner<V> {
    pub fn new(num_acceptors: usize) -> Self {
        LocalLearner {
            num_acceptors,
            state: Mutex::new(LearnerState {
                taught: HashMap::new(),
                consensus: None,
            }),
            consensus_reached: Condvar::new(),
        }
    }

    /// Non-blocking read of the decided value, if one is known yet.
    pub fn consensus(&self) -> Option<V> {
        self.state.lock().consensus.clone()
    }
}

impl<V: Value> Learner<V> for LocalLearner<V> {
    #[instrument]
    fn teach(&self, acceptor_id: Id, proposal: Proposal<V>) {
        let mut state = self.state.lock();

        match state.taught.get(&acceptor_id) {
            Some(prev) if proposal.number <= prev.number => {
                debug!("stale teach from acceptor {}, ignoring", acceptor_id);
                return;
            }
            _ => {}
        }
        state.taught.insert(acceptor_id, proposal);

        if state.consensus.is_some() {
            // The decision is final; later teaches only refresh the map.
            return;
        }

        let decided = {
            let values: Vec<&V> = state.taught.values().map(|p| &p.value).collect();
            majority_value(&values, quorum(self.num_acceptors)).cloned()
        };
        if let Some(value) = decided {
            info!("consensus reached on {:?}", value);
            state.consensus = Some(value);
            self.consensus_reached.notify_all();
        }
    }

    fn get_value(&self) -> V {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = &state.consensus {
                return value.clone();
            }
            self.consensus_reached.wait(&mut state);
        }
    }
}

/// Finds the value occurring at least `threshold` times among `values`.
///
/// V is not required to be hashable, so bucket counting is out; the
/// Boyer-Moore voting scan finds the only possible majority candidate in one
/// linear pass, and a second pass checks whether it actually meets the
/// threshold.
fn majority_value<'a, V: Eq>(values: &[&'a V], threshold: usize) -> Option<&'a V> {
    let (&first, rest) = values.split_first()?;

    let mut candidate = first;
    let mut score = 1usize;
    for &value in rest {
        if value == candidate {
            score += 1;
        } else {
            score -= 1;
        }
        if score == 0 {
            candidate = value;
            score = 1;
        }
    }

    let count = values.iter().filter(|&value| *value == candidate).count();
    if count >= threshold {
        Some(candidate)
    } else {
        None
    }
}
