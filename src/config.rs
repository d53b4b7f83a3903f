use log::warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{DEFAULT_AIRDROP_AMOUNT, DEFAULT_DIFFICULTY, DEFAULT_POW_REWARD};

/// Node settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Base URL other nodes use to reach us.
    pub public_addr: String,
    pub difficulty: usize,
    pub pow_reward: u64,
    pub airdrop_amount: u64,
    /// Base URL of a node to join at startup.
    pub bootstrap_peer: Option<String>,
    pub mining_workers: usize,
    pub peer_timeout: Duration,
    pub join_attempts: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let host = "127.0.0.1".to_string();
        let port = 5000;
        Self {
            public_addr: format!("http://{host}:{port}"),
            host,
            port,
            difficulty: DEFAULT_DIFFICULTY,
            pow_reward: DEFAULT_POW_REWARD,
            airdrop_amount: DEFAULT_AIRDROP_AMOUNT,
            bootstrap_peer: None,
            mining_workers: default_workers(),
            peer_timeout: Duration::from_secs(5),
            join_attempts: 3,
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parsed(&lookup, "PORT", defaults.port);
        let public_addr = lookup("PUBLIC_ADDR").unwrap_or_else(|| format!("http://{host}:{port}"));

        Self {
            host,
            port,
            public_addr,
            difficulty: parsed(&lookup, "POW_DIFFICULTY", defaults.difficulty),
            pow_reward: parsed(&lookup, "POW_REWARD", defaults.pow_reward),
            airdrop_amount: parsed(&lookup, "AIRDROP_AMOUNT", defaults.airdrop_amount),
            bootstrap_peer: lookup("BOOTSTRAP_PEER").filter(|v| !v.trim().is_empty()),
            mining_workers: parsed(&lookup, "MINING_WORKERS", defaults.mining_workers).max(1),
            peer_timeout: Duration::from_secs(parsed(
                &lookup,
                "PEER_TIMEOUT_SECS",
                defaults.peer_timeout.as_secs(),
            )),
            join_attempts: parsed(&lookup, "JOIN_RETRIES", defaults.join_attempts).max(1),
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("config: ignoring unparseable {key}={raw:?}");
            default
        }),
        None => default,
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> NodeConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = from_pairs(&[]);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.difficulty, 4);
        assert_eq!(cfg.pow_reward, 1);
        assert_eq!(cfg.airdrop_amount, 100);
        assert_eq!(cfg.public_addr, "http://127.0.0.1:5000");
        assert!(cfg.bootstrap_peer.is_none());
        assert!(cfg.mining_workers >= 1);
    }

    #[test]
    fn values_are_read_and_bad_ones_ignored() {
        let cfg = from_pairs(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "6001"),
            ("POW_DIFFICULTY", "two"),
            ("BOOTSTRAP_PEER", "http://10.0.0.1:5000"),
            ("JOIN_RETRIES", "0"),
        ]);
        assert_eq!(cfg.public_addr, "http://0.0.0.0:6001");
        assert_eq!(cfg.difficulty, 4);
        assert_eq!(cfg.bootstrap_peer.as_deref(), Some("http://10.0.0.1:5000"));
        assert_eq!(cfg.join_attempts, 1);
    }
}
