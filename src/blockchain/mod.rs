pub mod block;
pub mod model;

pub use block::{Block, BlockRecord};
pub use model::Ledger;

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Amount minted for the miner of each block.
pub const DEFAULT_POW_REWARD: u64 = 1;

/// Amount handed out by the airdrop endpoint.
pub const DEFAULT_AIRDROP_AMOUNT: u64 = 100;
