pub mod client;
pub mod peer;

pub use client::{HttpPeerAdapter, PeerAdapter, PeerClient};
pub use peer::{Peer, PeerRecord, PeerRegistry, SUPPORTED_PROTOCOLS};
