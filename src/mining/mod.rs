pub mod miner;
pub mod worker;

pub use miner::{CancelToken, Miner, MinerState, mine_parallel};
pub use worker::{MiningJob, MiningWorker};
