use chrono::Utc;
use log::{debug, warn};
use std::collections::HashSet;

use super::model::Transaction;
use crate::blockchain::{Block, Ledger};

/// Pending transactions waiting to be mined.
///
/// Entries are flagged by [`TransactionPool::mark_confirmed`] when a block that
/// carries them is accepted, and dropped by the next [`TransactionPool::prune`].
#[derive(Debug, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Admit a user transaction. Rewards cannot be submitted from outside,
    /// the sender must be able to cover `amount` on chain, and the signature
    /// must verify.
    ///
    /// There is no duplicate-hash check: the same transaction can be queued twice.
    pub fn add_transaction(&mut self, tx: Transaction, ledger: &Ledger) -> bool {
        let Some(sender) = tx.sender() else {
            warn!("pool: rejected reward-shaped tx {}", tx.hash());
            return false;
        };

        let balance = ledger.compute_balance(sender);
        if i128::from(tx.amount()) > balance {
            warn!(
                "pool: rejected tx {}: amount {} exceeds balance {}",
                tx.hash(),
                tx.amount(),
                balance
            );
            return false;
        }

        if !tx.verify_signature() {
            warn!("pool: rejected tx {}: signature check failed", tx.hash());
            return false;
        }

        let before = self.transactions.len();
        debug!(
            "pool: tx {} accepted (from_peer={}, size: {} -> {})",
            tx.hash(),
            tx.is_from_peer(),
            before,
            before + 1
        );
        self.transactions.push(tx);
        true
    }

    pub fn mark_confirmed(&mut self, block: &Block) {
        let confirmed: HashSet<&str> = block.transactions().iter().map(|t| t.hash()).collect();
        for tx in self
            .transactions
            .iter_mut()
            .filter(|t| confirmed.contains(t.hash()))
        {
            tx.mark_confirmed();
        }
    }

    pub fn prune(&mut self) {
        let before = self.transactions.len();
        self.transactions.retain(|t| !t.is_confirmed());
        debug!(
            "pool pruned: {} -> {} (removed {})",
            before,
            self.transactions.len(),
            before - self.transactions.len()
        );
    }

    /// Pending transactions plus a fresh reward for `miner_address`, appended
    /// last. Empty when there is nothing to mine.
    pub fn prepare_mining_set(&mut self, miner_address: &str, ledger: &Ledger) -> Vec<Transaction> {
        self.prune();
        if self.transactions.is_empty() {
            return Vec::new();
        }

        let reward = Transaction::reward(
            miner_address.to_string(),
            ledger.pow_reward(),
            Utc::now().timestamp(),
        );
        let mut set = Vec::with_capacity(self.transactions.len() + 1);
        set.extend(self.transactions.iter().cloned());
        set.push(reward);
        set
    }

    /// Faucet: queue a reward-shaped transaction without any checks.
    pub fn grant_airdrop(&mut self, recipient: &str, amount: u64) -> bool {
        let tx = Transaction::reward(recipient.to_string(), amount, Utc::now().timestamp());
        debug!("pool: airdrop {} -> {} ({})", amount, recipient, tx.hash());
        self.transactions.push(tx);
        true
    }
}
