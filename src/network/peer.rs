use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use crate::canonical;
use crate::error::{LedgerError, Result};

/// Transport protocols a peer may advertise.
pub const SUPPORTED_PROTOCOLS: &[&str] = &["http"];

/// Wire form of a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub protocol: String,
    pub addr: String,
    pub hash: String,
}

/// Another node, identified by the hash of `{protocol, addr}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    protocol: String,
    addr: String,
    hash: String,
}

impl Peer {
    /// `addr` is the base URL, e.g. `http://127.0.0.1:5000`.
    pub fn new(protocol: &str, addr: &str) -> Result<Self> {
        if !SUPPORTED_PROTOCOLS.contains(&protocol) {
            return Err(LedgerError::UnsupportedProtocol(protocol.to_string()));
        }
        Ok(Self {
            protocol: protocol.to_string(),
            addr: addr.to_string(),
            hash: Self::compute_hash(protocol, addr),
        })
    }

    fn compute_hash(protocol: &str, addr: &str) -> String {
        canonical::hash(&json!({ "protocol": protocol, "addr": addr }))
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn to_record(&self) -> PeerRecord {
        PeerRecord {
            protocol: self.protocol.clone(),
            addr: self.addr.clone(),
            hash: self.hash.clone(),
        }
    }

    pub fn from_record(record: PeerRecord) -> Result<Self> {
        let peer = Self::new(&record.protocol, &record.addr)?;
        if peer.hash != record.hash {
            return Err(LedgerError::HashIntegrity {
                kind: "Peer",
                computed: peer.hash,
                supplied: record.hash,
            });
        }
        Ok(peer)
    }
}

/// Known peers keyed by content hash.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<String, Peer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
        }
    }

    /// Insert unless a peer with the same hash is already known.
    pub fn add(&mut self, peer: Peer) -> bool {
        if self.peers.contains_key(peer.hash()) {
            return false;
        }
        self.peers.insert(peer.hash().to_string(), peer);
        true
    }

    pub fn get(&self, hash: &str) -> Option<&Peer> {
        self.peers.get(hash)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Unordered.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn records(&self) -> Vec<PeerRecord> {
        self.iter().map(Peer::to_record).collect()
    }
}
