use actix_web::web;
use log::{info, warn};

use crate::api::AppState;
use crate::blockchain::{Block, Ledger};
use crate::network::HttpPeerAdapter;
use crate::transaction::{Transaction, TransactionPool};

/// Ledger and pool of one node. They are mutated together under one lock, so
/// appending a block and confirming its transactions is a single step.
#[derive(Debug, Default)]
pub struct NodeCore {
    pub ledger: Ledger,
    pub pool: TransactionPool,
}

impl NodeCore {
    pub fn new(difficulty: usize, pow_reward: u64) -> Self {
        Self {
            ledger: Ledger::new(difficulty, pow_reward),
            pool: TransactionPool::new(),
        }
    }

    pub fn add_block(&mut self, block: Option<Block>) -> bool {
        self.ledger.add_block(block, &mut self.pool)
    }

    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        self.pool.add_transaction(tx, &self.ledger)
    }

    pub fn prepare_mining_set(&mut self, miner_address: &str) -> Vec<Transaction> {
        self.pool.prepare_mining_set(miner_address, &self.ledger)
    }

    pub fn grant_airdrop(&mut self, recipient: &str, amount: u64) -> bool {
        self.pool.grant_airdrop(recipient, amount)
    }
}

/// Announce ourselves to `bootstrap_addr` and register every peer it returns.
///
/// An unreachable bootstrap is logged and otherwise ignored; local chain and
/// pool state are never touched here.
pub async fn join_network(state: web::Data<AppState>, bootstrap_addr: String) -> usize {
    let peers = match state
        .peer_client
        .join(HttpPeerAdapter::PROTOCOL, &bootstrap_addr, &state.self_peer)
        .await
    {
        Ok(peers) => peers,
        Err(e) => {
            warn!("join via {} failed: {}", bootstrap_addr, e);
            return 0;
        }
    };

    let mut registry = state.peers.write().expect("rwlock poisoned");
    let added = peers.into_iter().filter(|p| registry.add(p.clone())).count();
    info!(
        "joined via {}: {} new peers ({} known)",
        bootstrap_addr,
        added,
        registry.len()
    );
    added
}
