use chrono::Utc;
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::blockchain::Block;
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerState {
    Idle,
    Searching,
    Found,
    Cancelled,
}

/// Shared flag checked on every nonce; cancelling never interrupts a hash
/// midway, the search just stops at the next iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything about the candidate block except the nonce.
struct Template {
    index: u64,
    timestamp: i64,
    tx_values: Value,
    prev_hash: Option<String>,
    target: String,
}

impl Template {
    fn new(difficulty: usize, last_block: Option<&Block>, txs: &[Transaction], timestamp: i64) -> Self {
        Self {
            index: last_block.map_or(1, |b| b.index() + 1),
            timestamp,
            tx_values: Block::transaction_values(txs),
            prev_hash: last_block.map(|b| b.hash().to_string()),
            target: "0".repeat(difficulty),
        }
    }

    fn meets_target(&self, nonce: u64) -> bool {
        Block::hash_parts(
            self.index,
            self.timestamp,
            &self.tx_values,
            nonce,
            self.prev_hash.as_deref(),
        )
        .starts_with(&self.target)
    }

    fn seal(self, txs: Vec<Transaction>, nonce: u64) -> Block {
        Block::new(self.index, self.timestamp, txs, nonce, self.prev_hash)
    }
}

/// Scan `start, start+step, ...` until a nonce meets the target or `stop`
/// says another searcher is done. Returns the nonce and how many were tried.
fn search(template: &Template, start: u64, step: u64, stop: &dyn Fn() -> bool) -> (Option<u64>, u64) {
    let mut nonce = start;
    let mut tried = 0u64;
    loop {
        if stop() {
            return (None, tried);
        }
        tried += 1;
        if template.meets_target(nonce) {
            return (Some(nonce), tried);
        }
        match nonce.checked_add(step) {
            Some(next) => nonce = next,
            None => return (None, tried),
        }
    }
}

/// Single-threaded Proof-of-Work search.
#[derive(Debug)]
pub struct Miner {
    difficulty: usize,
    state: MinerState,
    iterations: u64,
}

impl Miner {
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty,
            state: MinerState::Idle,
            iterations: 0,
        }
    }

    pub fn state(&self) -> MinerState {
        self.state
    }

    /// Nonces tried by the last search.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Mine on top of `last_block` with the timestamp fixed to now.
    /// `None` means there was nothing to mine.
    pub fn mine(&mut self, last_block: Option<&Block>, transactions: Vec<Transaction>) -> Option<Block> {
        self.mine_at(
            last_block,
            transactions,
            Utc::now().timestamp(),
            &CancelToken::new(),
        )
    }

    pub fn mine_at(
        &mut self,
        last_block: Option<&Block>,
        transactions: Vec<Transaction>,
        timestamp: i64,
        cancel: &CancelToken,
    ) -> Option<Block> {
        self.iterations = 0;
        if transactions.is_empty() {
            self.state = MinerState::Idle;
            return None;
        }

        self.state = MinerState::Searching;
        let template = Template::new(self.difficulty, last_block, &transactions, timestamp);
        let (found, tried) = search(&template, 0, 1, &|| cancel.is_cancelled());
        self.iterations = tried;

        match found {
            Some(nonce) => {
                self.state = MinerState::Found;
                debug!("miner: nonce {} found after {} tries", nonce, tried);
                Some(template.seal(transactions, nonce))
            }
            None => {
                self.state = MinerState::Cancelled;
                None
            }
        }
    }
}

/// Parallel search: worker `w` of `workers` scans nonces `w, w+workers, ...`.
/// The first hit stops its siblings. When several hit at once the lowest
/// nonce wins.
pub fn mine_parallel(
    difficulty: usize,
    last_block: Option<&Block>,
    transactions: Vec<Transaction>,
    timestamp: i64,
    workers: usize,
    cancel: &CancelToken,
) -> Option<Block> {
    if transactions.is_empty() {
        return None;
    }

    let workers = workers.max(1) as u64;
    let template = Template::new(difficulty, last_block, &transactions, timestamp);
    let found = AtomicBool::new(false);

    let best = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let template = &template;
                let found = &found;
                scope.spawn(move || {
                    let stop = || found.load(Ordering::Relaxed) || cancel.is_cancelled();
                    let (nonce, _) = search(template, w, workers, &stop);
                    if nonce.is_some() {
                        found.store(true, Ordering::Relaxed);
                    }
                    nonce
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|h| h.join().ok().flatten())
            .min()
    })?;

    Some(template.seal(transactions, best))
}
