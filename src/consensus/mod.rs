pub mod acceptor;
pub mod cluster;
pub mod learner;
pub mod proposer;
pub mod types;
