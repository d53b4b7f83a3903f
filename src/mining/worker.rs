use chrono::Utc;
use log::{debug, info, warn};
use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::miner::{CancelToken, Miner, mine_parallel};
use crate::blockchain::Block;
use crate::transaction::Transaction;

/// A unit of mining work: build on `last_block` with `transactions`.
#[derive(Debug)]
pub struct MiningJob {
    pub id: Uuid,
    pub last_block: Option<Block>,
    pub transactions: Vec<Transaction>,
}

impl MiningJob {
    pub fn new(last_block: Option<Block>, transactions: Vec<Transaction>) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_block,
            transactions,
        }
    }

    /// Height of the block this job would produce.
    pub fn target_index(&self) -> u64 {
        self.last_block.as_ref().map_or(1, |b| b.index() + 1)
    }
}

#[derive(Debug, Default)]
struct InFlight {
    target_index: u64,
    token: CancelToken,
}

/// Handle to the dedicated mining thread.
///
/// Jobs go in over a channel and found blocks come back over `results`; the
/// search itself never runs on a request-handling thread. A job whose height
/// was already accepted while it sat in the queue is dropped without searching.
#[derive(Debug)]
pub struct MiningWorker {
    jobs: Sender<MiningJob>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    accepted: Arc<AtomicU64>,
}

impl MiningWorker {
    pub fn spawn(
        difficulty: usize,
        workers: usize,
        results: UnboundedSender<Block>,
    ) -> io::Result<Self> {
        let (jobs, rx) = mpsc::channel::<MiningJob>();
        let in_flight: Arc<Mutex<Option<InFlight>>> = Arc::new(Mutex::new(None));
        let slot = in_flight.clone();
        let accepted: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
        let tip = accepted.clone();

        thread::Builder::new()
            .name("miner".into())
            .spawn(move || {
                for job in rx {
                    let token = CancelToken::new();
                    {
                        // Checked under the slot lock so `cancel_stale` either
                        // sees this job in flight or has already raised `tip`.
                        let mut guard = slot.lock().expect("mutex poisoned");
                        let accepted_tip = tip.load(Ordering::SeqCst);
                        if job.target_index() <= accepted_tip {
                            debug!(
                                "MINER - job {} skipped: #{} already accepted (tip #{})",
                                job.id,
                                job.target_index(),
                                accepted_tip
                            );
                            continue;
                        }
                        *guard = Some(InFlight {
                            target_index: job.target_index(),
                            token: token.clone(),
                        });
                    }

                    debug!(
                        "MINER - job {} started (index={}, txs={})",
                        job.id,
                        job.target_index(),
                        job.transactions.len()
                    );
                    let timestamp = Utc::now().timestamp();
                    let mined = if workers > 1 {
                        mine_parallel(
                            difficulty,
                            job.last_block.as_ref(),
                            job.transactions,
                            timestamp,
                            workers,
                            &token,
                        )
                    } else {
                        Miner::new(difficulty).mine_at(
                            job.last_block.as_ref(),
                            job.transactions,
                            timestamp,
                            &token,
                        )
                    };
                    *slot.lock().expect("mutex poisoned") = None;

                    match mined {
                        Some(block) => {
                            info!(
                                "MINER - job {} sealed block #{} (hash={}, nonce={})",
                                job.id,
                                block.index(),
                                block.hash(),
                                block.nonce()
                            );
                            if results.send(block).is_err() {
                                warn!("MINER - result channel closed, stopping");
                                break;
                            }
                        }
                        None => debug!("MINER - job {} cancelled", job.id),
                    }
                }
            })?;

        Ok(Self {
            jobs,
            in_flight,
            accepted,
        })
    }

    /// Queue a job. `false` if the mining thread is gone.
    pub fn submit(&self, job: MiningJob) -> bool {
        self.jobs.send(job).is_ok()
    }

    /// Record that `accepted_index` is on the chain. Stops the running search
    /// if its height is now taken; queued jobs at or below it are skipped.
    pub fn cancel_stale(&self, accepted_index: u64) {
        let guard = self.in_flight.lock().expect("mutex poisoned");
        self.accepted.fetch_max(accepted_index, Ordering::SeqCst);
        if let Some(job) = guard.as_ref().filter(|j| j.target_index <= accepted_index) {
            debug!(
                "MINER - cancelling search for #{} (accepted #{})",
                job.target_index, accepted_index
            );
            job.token.cancel();
        }
    }
}
