#[macro_use]
extern crate tracing;

use anyhow::Error;
use clap::Parser;
use paxos::consensus::cluster::Cluster;
use paxos::consensus::learner::Learner;
use paxos::consensus::types::Id;
use paxos::logging::setup_logging;
use rand::distributions::{Distribution, Uniform};
use serde::Serialize;
use std::time::Duration;

/// Runs one single-process consensus decision: a cluster of acceptors and
/// learners, raced by several proposers started with randomized delays.
#[derive(Parser, Debug, Serialize)]
struct Opts {
    /// Number of acceptors (voting members)
    #[clap(long, default_value_t = 3)]
    num_acceptors: usize,

    /// Number of learners observing the decision
    #[clap(long, default_value_t = 2)]
    num_learners: usize,

    /// Number of competing proposers
    #[clap(long, default_value_t = 2)]
    num_proposers: usize,

    /// Upper bound on the random delay before each proposer starts, in ms
    #[clap(long, default_value_t = 50)]
    max_start_delay_ms: u64,
}

fn main() -> Result<(), Error> {
    let _guards = setup_logging()?;
    let opts = Opts::parse();
    info!(
        "running a single decision with options {}",
        serde_json::to_string(&opts)?
    );

    let cluster = Cluster::new(opts.num_acceptors, opts.num_learners)?;

    crossbeam::thread::scope(|s| {
        for id in 0..opts.num_proposers {
            let proposer = cluster.proposer(id as Id);
            let value = format!("value of proposer {}", id);
            let max_delay = opts.max_start_delay_ms;
            s.spawn(move |_| {
                if max_delay > 0 {
                    let delay = Uniform::from(0..max_delay).sample(&mut rand::thread_rng());
                    std::thread::sleep(Duration::from_millis(delay));
                }
                let decided = proposer.propose(value);
                info!("proposer {} finished, quorum accepted {:?}", id, decided);
            });
        }
    })
    .map_err(|_| anyhow::anyhow!("a proposer thread panicked"))?;

    for (id, learner) in cluster.learners.iter().enumerate() {
        info!("learner {} reports decided value {:?}", id, learner.get_value());
    }

    Ok(())
}
