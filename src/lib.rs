pub mod consensus;
pub mod logging;

pub use consensus::acceptor::{Acceptor, LocalAcceptor};
pub use consensus::cluster::{Cluster, ClusterError};
pub use consensus::learner::{Learner, LocalLearner};
pub use consensus::proposer::Proposer;
pub use consensus::types::{quorum, Ballot, Id, Proposal, Promise, Value};
