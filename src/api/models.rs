use log::{debug, info};
use serde::Serialize;
use std::sync::RwLock;

use crate::blockchain::Block;
use crate::config::NodeConfig;
use crate::error::Result;
use crate::mining::MiningWorker;
use crate::network::{HttpPeerAdapter, Peer, PeerClient, PeerRegistry};
use crate::node::NodeCore;

/// Everything a request handler may touch. Handlers hold no state of their own.
///
/// `core` is written by block/transaction admission and read by queries;
/// readers never see a half-appended block.
pub struct AppState {
    pub core: RwLock<NodeCore>,
    pub peers: RwLock<PeerRegistry>,
    pub self_peer: Peer,
    pub peer_client: PeerClient,
    pub miner: MiningWorker,
    pub airdrop_amount: u64,
}

impl AppState {
    /// The node always knows itself, so a join answer includes the answering node.
    pub fn new(config: &NodeConfig, miner: MiningWorker) -> Result<Self> {
        let self_peer = Peer::new(HttpPeerAdapter::PROTOCOL, &config.public_addr)?;
        let mut peers = PeerRegistry::new();
        peers.add(self_peer.clone());

        Ok(Self {
            core: RwLock::new(NodeCore::new(config.difficulty, config.pow_reward)),
            peers: RwLock::new(peers),
            self_peer,
            peer_client: PeerClient::new(config.peer_timeout, config.join_attempts)?,
            miner,
            airdrop_amount: config.airdrop_amount,
        })
    }

    /// Single path for blocks into the chain, whatever their origin. A
    /// successful append stops any local search that just became stale.
    pub fn submit_block(&self, block: Block) -> bool {
        let index = block.index();
        let accepted = {
            let mut core = self.core.write().expect("rwlock poisoned");
            core.add_block(Some(block))
        };
        if accepted {
            self.miner.cancel_stale(index);
            info!("block #{} accepted", index);
        } else {
            debug!("block #{} rejected", index);
        }
        accepted
    }
}

/* ---------- Wallet API Models (dev) ---------- */

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub private_key: String,
    pub public_key: String,
}
