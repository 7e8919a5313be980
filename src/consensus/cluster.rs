use crate::consensus::acceptor::{Acceptor, LocalAcceptor};
use crate::consensus::learner::{Learner, LocalLearner};
use crate::consensus::proposer::Proposer;
use crate::consensus::types::{Id, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("a cluster requires at least one acceptor")]
    NoAcceptors,
}

/// One consensus group wired in-process: every acceptor teaches every
/// learner, and proposers created from the cluster talk to every acceptor.
/// Instances decide a single value; a new decision needs a new cluster.
pub struct Cluster<V: Value> {
    pub acceptors: Vec<Arc<LocalAcceptor<V>>>,
    pub learners: Vec<Arc<LocalLearner<V>>>,
}

impl<V: Value> Cluster<V> {
    /// Builds the group, assigning acceptor ids 0..`num_acceptors`. A cluster
    /// without learners is valid; nobody will observe the decision.
    pub fn new(num_acceptors: usize, num_learners: usize) -> Result<Self, ClusterError> {
        if num_acceptors == 0 {
            return Err(ClusterError::NoAcceptors);
        }

        let learners: Vec<Arc<LocalLearner<V>>> = (0..num_learners)
            .map(|_| Arc::new(LocalLearner::new(num_acceptors)))
            .collect();

        let acceptors = (0..num_acceptors)
            .map(|id| {
                let handles = learners
                    .iter()
                    .map(|learner| learner.clone() as Arc<dyn Learner<V>>)
                    .collect();
                Arc::new(LocalAcceptor::new(id as Id, handles))
            })
            .collect();

        Ok(Cluster { acceptors, learners })
    }

    /// A proposer wired to every acceptor in the group.
    pub fn proposer(&self, id: Id) -> Proposer<V> {
        let handles = self
            .acceptors
            .iter()
            .map(|acceptor| acceptor.clone() as Arc<dyn Acceptor<V>>)
            .collect();
        Proposer::new(id, handles)
    }
}
