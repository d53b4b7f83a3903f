use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::peer::{Peer, PeerRecord};
use crate::blockchain::Block;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

const RETRY_BACKOFF_MS: u64 = 200;

/// Outbound HTTP calls to another node.
#[derive(Debug, Clone)]
pub struct HttpPeerAdapter {
    client: Client,
    attempts: u32,
}

impl HttpPeerAdapter {
    pub const PROTOCOL: &'static str = "http";

    fn check_peer_protocol(&self, peer: &Peer) -> Result<()> {
        if peer.protocol() != Self::PROTOCOL {
            return Err(LedgerError::AdapterProtocolMismatch {
                peer: peer.protocol().to_string(),
                adapter: Self::PROTOCOL.to_string(),
            });
        }
        Ok(())
    }

    /// POST `body` as JSON, retrying transport failures with a linear backoff.
    /// Non-2xx answers are not retried.
    async fn post_json<B, R>(&self, peer: &Peer, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.check_peer_protocol(peer)?;
        let url = format!("{}{}", peer.addr().trim_end_matches('/'), path);

        let mut attempt = 1;
        loop {
            match self.client.post(&url).json(body).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp.json::<R>().await?),
                Ok(resp) => {
                    return Err(LedgerError::Transport(format!(
                        "{} answered {}",
                        url,
                        resp.status()
                    )));
                }
                Err(e) if attempt < self.attempts => {
                    warn!("POST {} failed (attempt {}/{}): {}", url, attempt, self.attempts, e);
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)))
                        .await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn send_tx(&self, peer: &Peer, tx: &Transaction) -> Result<bool> {
        self.post_json(peer, "/broadcast/tx", &tx.to_record()).await
    }

    pub async fn send_block(&self, peer: &Peer, block: &Block) -> Result<bool> {
        self.post_json(peer, "/broadcast/block", &block.to_record()).await
    }

    pub async fn send_peer(&self, peer: &Peer, info: &Peer) -> Result<bool> {
        self.post_json(peer, "/broadcast/peer", &info.to_record()).await
    }

    /// Announce `self_peer` to `peer` and return the peers it knows about.
    pub async fn join(&self, peer: &Peer, self_peer: &Peer) -> Result<Vec<Peer>> {
        let records: Option<Vec<PeerRecord>> =
            self.post_json(peer, "/join", &self_peer.to_record()).await?;
        records
            .unwrap_or_default()
            .into_iter()
            .map(Peer::from_record)
            .collect()
    }
}

/// Closed set of transports, chosen by the peer's protocol tag.
#[derive(Debug, Clone)]
pub enum PeerAdapter {
    Http(HttpPeerAdapter),
}

impl PeerAdapter {
    pub fn protocol(&self) -> &'static str {
        match self {
            PeerAdapter::Http(_) => HttpPeerAdapter::PROTOCOL,
        }
    }

    pub async fn send_tx(&self, peer: &Peer, tx: &Transaction) -> Result<bool> {
        match self {
            PeerAdapter::Http(a) => a.send_tx(peer, tx).await,
        }
    }

    pub async fn send_block(&self, peer: &Peer, block: &Block) -> Result<bool> {
        match self {
            PeerAdapter::Http(a) => a.send_block(peer, block).await,
        }
    }

    pub async fn send_peer(&self, peer: &Peer, info: &Peer) -> Result<bool> {
        match self {
            PeerAdapter::Http(a) => a.send_peer(peer, info).await,
        }
    }

    pub async fn join(&self, peer: &Peer, self_peer: &Peer) -> Result<Vec<Peer>> {
        match self {
            PeerAdapter::Http(a) => a.join(peer, self_peer).await,
        }
    }
}

/// Entry point for talking to other nodes.
///
/// Which peers to send to is up to the caller; this type only knows how to
/// reach one.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: Client,
    attempts: u32,
}

impl PeerClient {
    pub fn new(timeout: Duration, attempts: u32) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            attempts: attempts.max(1),
        })
    }

    pub fn adapter(&self, protocol: &str) -> Result<PeerAdapter> {
        match protocol {
            HttpPeerAdapter::PROTOCOL => Ok(PeerAdapter::Http(HttpPeerAdapter {
                client: self.http.clone(),
                attempts: self.attempts,
            })),
            other => Err(LedgerError::AdapterProtocolMismatch {
                peer: other.to_string(),
                adapter: "none".to_string(),
            }),
        }
    }

    /// Join the network through the node at `protocol`/`addr`.
    pub async fn join(&self, protocol: &str, addr: &str, self_peer: &Peer) -> Result<Vec<Peer>> {
        let adapter = self.adapter(protocol)?;
        let bootstrap = Peer::new(protocol, addr)?;
        debug!("joining via {} ({})", bootstrap.addr(), adapter.protocol());
        adapter.join(&bootstrap, self_peer).await
    }

    pub async fn send_tx(&self, peer: &Peer, tx: &Transaction) -> Result<bool> {
        self.adapter(peer.protocol())?.send_tx(peer, tx).await
    }

    pub async fn send_block(&self, peer: &Peer, block: &Block) -> Result<bool> {
        self.adapter(peer.protocol())?.send_block(peer, block).await
    }

    pub async fn send_peer(&self, peer: &Peer, info: &Peer) -> Result<bool> {
        self.adapter(peer.protocol())?.send_peer(peer, info).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing;
    use crate::mining::Miner;
    use crate::wallet::generate_keypair_hex;

    fn client() -> PeerClient {
        PeerClient::new(Duration::from_millis(200), 2).unwrap()
    }

    #[test]
    fn adapter_is_selected_by_protocol() {
        let c = client();
        assert_eq!(c.adapter("http").unwrap().protocol(), "http");
        assert!(matches!(
            c.adapter("ws"),
            Err(LedgerError::AdapterProtocolMismatch { .. })
        ));
    }

    #[actix_web::test]
    async fn unreachable_peer_is_a_transport_error() {
        let me = Peer::new("http", "http://127.0.0.1:1").unwrap();
        // Port 1 is closed; both attempts fail and the error surfaces.
        let err = client().join("http", "http://127.0.0.1:1", &me).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }

    #[actix_web::test]
    async fn unsupported_bootstrap_protocol_fails_before_any_io() {
        let me = Peer::new("http", "http://127.0.0.1:5000").unwrap();
        let err = client().join("ftp", "ftp://x", &me).await.unwrap_err();
        assert!(matches!(err, LedgerError::AdapterProtocolMismatch { .. }));
    }

    #[actix_web::test]
    async fn sends_return_the_receivers_answer() {
        let receiver = testing::state("http://127.0.0.1:7201");
        let (url, server) = testing::serve(receiver.clone());
        let target = Peer::new("http", &url).unwrap();
        let c = PeerClient::new(Duration::from_secs(2), 1).unwrap();

        let newcomer = Peer::new("http", "http://127.0.0.1:7202").unwrap();
        assert!(c.send_peer(&target, &newcomer).await.unwrap());
        assert!(!c.send_peer(&target, &newcomer).await.unwrap());

        let (sk, pk) = generate_keypair_hex();
        let mut tx = Transaction::new(Some(pk.clone()), "bob".into(), 5, 1);
        tx.sign(&sk).unwrap();
        // Unfunded on the receiver's chain.
        assert!(!c.send_tx(&target, &tx).await.unwrap());

        let genesis = Miner::new(1)
            .mine(None, vec![Transaction::reward(pk, 10, 1)])
            .unwrap();
        assert!(c.send_block(&target, &genesis).await.unwrap());
        assert!(c.send_tx(&target, &tx).await.unwrap());

        {
            let core = receiver.core.read().unwrap();
            assert_eq!(core.ledger.len(), 1);
            assert_eq!(core.pool.len(), 1);
            assert!(core.pool.pending()[0].is_from_peer());
        }

        server.stop(true).await;
    }
}
