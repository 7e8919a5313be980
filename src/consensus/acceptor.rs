use crate::consensus::learner::Learner;
use crate::consensus::types::*;
use derivative::Derivative;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Votes on proposals for one member of the consensus group. Arbitration is
/// the sole source of safety: every other role only observes its decisions.
pub trait Acceptor<V: Value>: Send + Sync {
    /// Phase 1 arbitration. `None` is a rejection (or stands in for a
    /// non-response); a granted promise carries the previously accepted
    /// proposal, if there is one.
    fn prepare(&self, proposal: &Proposal<V>) -> Option<Promise<V>>;

    /// Phase 2 arbitration. Accepting records the proposal and teaches every
    /// wired learner.
    fn accept(&self, proposal: &Proposal<V>) -> bool;
}

#[derive(Debug)]
struct AcceptorState<V> {
    /// Highest ballot seen via `prepare`. `None` is below any valid ballot.
    max_promised: Option<Ballot>,
    accepted: Option<Proposal<V>>,
}

/// In-process acceptor. A single lock guards all of its state; `accept`
/// notifies learners while still holding it.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct LocalAcceptor<V: Value> {
    id: Id,
    #[derivative(Debug = "ignore")]
    learners: Vec<Arc<dyn Learner<V>>>,
    state: Mutex<AcceptorState<V>>,
}

impl<V: Value> LocalAcceptor<V> {
    pub fn new(id: Id, learners: Vec<Arc<dyn Learner<V>>>) -> Self {
        LocalAcceptor {
            id,
            learners,
            state: Mutex::new(AcceptorState {
                max_promised: None,
                accepted: None,
            }),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }
}

impl<V: Value> Acceptor<V> for LocalAcceptor<V> {
    #[instrument]
    fn prepare(&self, proposal: &Proposal<V>) -> Option<Promise<V>> {
        let mut state = self.state.lock();

        if state.max_promised.map_or(false, |max| proposal.number < max) {
            warn!("ballot is below the highest promised, ignoring prepare");
            return None;
        }

        // Equal ballots are granted; only a strictly greater one raises the mark.
        if state.max_promised.map_or(true, |max| max < proposal.number) {
            state.max_promised = Some(proposal.number);
        }

        Some(match &state.accepted {
            Some(accepted) => Promise::with_proposal(accepted.clone()),
            None => Promise::without_proposal(),
        })
    }

    #[instrument]
    fn accept(&self, proposal: &Proposal<V>) -> bool {
        let mut state = self.state.lock();

        // Arbitrated against the last ballot seen via prepare, not against the
        // accepted proposal's own ballot: a ballot that skipped prepare is
        // still acceptable unless it is below the last one prepared.
        if state.max_promised.map_or(false, |max| proposal.number < max) {
            warn!("ballot is below the highest promised, rejecting accept");
            return false;
        }

        info!("accepted proposal");
        state.accepted = Some(proposal.clone());

        // Taught under the lock, so acceptances reach each learner in the
        // order this acceptor made them. A slow learner stalls this
        // acceptor's next caller.
        for learner in &self.learners {
            learner.teach(self.id, proposal.clone());
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every teach call so tests can assert on notifications.
    #[derive(Default)]
    struct RecordingLearner {
        taught: Mutex<Vec<(Id, Proposal<&'static str>)>>,
    }

    impl RecordingLearner {
        fn taught(&self) -> Vec<(Id, Proposal<&'static str>)> {
            self.taught.lock().clone()
        }
    }

    impl Learner<&'static str> for RecordingLearner {
        fn teach(&self, acceptor_id: Id, proposal: Proposal<&'static str>) {
            self.taught.lock().push((acceptor_id, proposal));
        }

        fn get_value(&self) -> &'static str {
            unreachable!("not exercised by acceptor tests")
        }
    }

    fn p1() -> Proposal<&'static str> {
        Proposal::new(1, "foo")
    }

    fn p2() -> Proposal<&'static str> {
        Proposal::new(2, "bar")
    }

    fn lone_acceptor() -> LocalAcceptor<&'static str> {
        LocalAcceptor::new(1, vec![])
    }

    #[test]
    fn initial_prepare_granted_without_proposal() {
        let acceptor = lone_acceptor();
        let promise = acceptor.prepare(&p1()).expect("fresh prepare must be granted");
        assert!(promise.accepted().is_none());
    }

    #[test]
    fn greater_prepare_before_accept() {
        let acceptor = lone_acceptor();
        acceptor.prepare(&p1());
        let promise = acceptor.prepare(&p2()).expect("greater ballot must be granted");
        assert!(promise.accepted().is_none());
    }

    #[test]
    fn lesser_prepare_before_accept() {
        let acceptor = lone_acceptor();
        acceptor.prepare(&p2());
        assert!(acceptor.prepare(&p1()).is_none());
    }

    #[test]
    fn equal_prepare_granted() {
        let acceptor = lone_acceptor();
        acceptor.prepare(&p1());
        assert!(acceptor.prepare(&p1()).is_some());
    }

    #[test]
    fn accept_notifies_every_learner_once() {
        let learner1 = Arc::new(RecordingLearner::default());
        let learner2 = Arc::new(RecordingLearner::default());
        let acceptor = LocalAcceptor::new(
            1,
            vec![
                learner1.clone() as Arc<dyn Learner<&'static str>>,
                learner2.clone() as Arc<dyn Learner<&'static str>>,
            ],
        );

        acceptor.prepare(&p1());
        assert!(acceptor.accept(&p1()));

        assert_eq!(learner1.taught(), vec![(1, p1())]);
        assert_eq!(learner2.taught(), vec![(1, p1())]);
    }

    #[test]
    fn greater_prepare_after_accept_carries_proposal() {
        let acceptor = lone_acceptor();
        acceptor.prepare(&p1());
        acceptor.accept(&p1());

        let promise = acceptor.prepare(&p2()).expect("greater ballot must be granted");
        assert_eq!(promise.accepted(), Some(&p1()));
    }

    #[test]
    fn lesser_prepare_after_accept() {
        let acceptor = lone_acceptor();
        acceptor.prepare(&p2());
        acceptor.accept(&p2());
        assert!(acceptor.prepare(&p1()).is_none());
    }

    #[test]
    fn lesser_accept_rejected_without_teaching() {
        let learner = Arc::new(RecordingLearner::default());
        let acceptor = LocalAcceptor::new(1, vec![learner.clone() as Arc<dyn Learner<&'static str>>]);

        acceptor.prepare(&p1());
        acceptor.prepare(&p2());
        assert!(!acceptor.accept(&p1()));
        assert!(learner.taught().is_empty());
    }

    #[test]
    fn greater_accept_after_prepare() {
        let learner = Arc::new(RecordingLearner::default());
        let acceptor = LocalAcceptor::new(1, vec![learner.clone() as Arc<dyn Learner<&'static str>>]);

        acceptor.prepare(&p1());
        acceptor.prepare(&p2());
        assert!(acceptor.accept(&p2()));
        assert_eq!(learner.taught(), vec![(1, p2())]);
    }

    #[test]
    fn reaccept_after_newer_prepare() {
        let learner = Arc::new(RecordingLearner::default());
        let acceptor = LocalAcceptor::new(1, vec![learner.clone() as Arc<dyn Learner<&'static str>>]);

        acceptor.prepare(&p1());
        acceptor.accept(&p1());
        acceptor.prepare(&p2());
        assert!(acceptor.accept(&p2()));
        assert_eq!(learner.taught(), vec![(1, p1()), (1, p2())]);
    }

    #[test]
    fn accept_without_any_prepare() {
        let acceptor = lone_acceptor();
        assert!(acceptor.accept(&p1()));
    }

    #[test]
    fn accept_above_last_prepared_ballot() {
        // An accept is judged against the last prepared ballot, so a ballot
        // that never went through prepare can still be accepted.
        let acceptor = lone_acceptor();
        acceptor.prepare(&Proposal::new(5, "foo"));
        assert!(acceptor.accept(&Proposal::new(7, "bar")));

        let promise = acceptor.prepare(&Proposal::new(8, "baz")).unwrap();
        assert_eq!(promise.accepted(), Some(&Proposal::new(7, "bar")));
    }
}
