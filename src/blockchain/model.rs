use log::{debug, info};
use serde_json::Value;

use super::{Block, DEFAULT_DIFFICULTY, DEFAULT_POW_REWARD};
use crate::canonical;
use crate::transaction::TransactionPool;

/// Append-only in-memory chain with Proof-of-Work.
///
/// Blocks only enter through [`Ledger::add_block`]; there is no way to remove
/// or reorder them afterwards.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: usize,
    pow_reward: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY, DEFAULT_POW_REWARD)
    }
}

impl Ledger {
    /// Start an empty chain; the first accepted block becomes genesis.
    pub fn new(difficulty: usize, pow_reward: u64) -> Self {
        Self {
            chain: Vec::new(),
            difficulty,
            pow_reward,
        }
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn pow_reward(&self) -> u64 {
        self.pow_reward
    }

    /// Required hash prefix: `difficulty` ASCII zeros.
    pub fn pow_target(&self) -> String {
        "0".repeat(self.difficulty)
    }

    pub fn validate_proof_of_work(&self, block: &Block) -> bool {
        block.hash().starts_with(&self.pow_target())
    }

    /// Non-genesis blocks carry exactly one reward and only valid signatures.
    /// Genesis content is taken as-is.
    pub fn validate_transactions(&self, block: &Block) -> bool {
        if block.transactions().is_empty() {
            return false;
        }
        if block.index() == 1 {
            return true;
        }

        let mut rewards = 0usize;
        for tx in block.transactions() {
            if tx.is_reward() {
                rewards += 1;
            }
            if !tx.verify_signature() {
                debug!("block #{} rejected: bad signature on {}", block.index(), tx.hash());
                return false;
            }
        }
        rewards == 1
    }

    pub fn validate_new_block(&self, block: &Block) -> bool {
        let pow_ok = self.validate_proof_of_work(block);
        let tx_ok = self.validate_transactions(block);

        match self.last_block() {
            Some(last) => {
                let index_ok = last.index() + 1 == block.index()
                    && block.index() == self.chain.len() as u64 + 1;
                let link_ok = block.prev_hash() == Some(last.hash());
                debug!(
                    "validate block #{}: pow={} tx={} index={} link={}",
                    block.index(),
                    pow_ok,
                    tx_ok,
                    index_ok,
                    link_ok
                );
                pow_ok && tx_ok && index_ok && link_ok
            }
            None => {
                let index_ok = block.index() == 1;
                debug!(
                    "validate genesis #{}: pow={} tx={} index={}",
                    block.index(),
                    pow_ok,
                    tx_ok,
                    index_ok
                );
                pow_ok && tx_ok && index_ok
            }
        }
    }

    /// Append a validated block and let the pool mark what it confirmed.
    pub fn add_block(&mut self, block: Option<Block>, pool: &mut TransactionPool) -> bool {
        let Some(block) = block else {
            return false;
        };
        if !self.validate_new_block(&block) {
            return false;
        }

        pool.mark_confirmed(&block);
        info!(
            "block #{} appended (hash={}, txs={}, from_peer={})",
            block.index(),
            block.hash(),
            block.transactions().len(),
            block.is_from_peer()
        );
        self.chain.push(block);
        true
    }

    /// Full replay of every transaction. Balances can go negative for
    /// addresses that were debited by a genesis block.
    pub fn compute_balance(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;
        for tx in self.chain.iter().flat_map(|b| b.transactions()) {
            if tx.sender() == Some(address) {
                balance -= i128::from(tx.amount());
            } else if tx.recipient() == address {
                balance += i128::from(tx.amount());
            }
        }
        debug!("balance of {}: {}", address, balance);
        balance
    }

    /// Whole chain as sorted-key JSON text.
    pub fn to_canonical_text(&self) -> String {
        canonical::encode(&Value::Array(
            self.chain.iter().map(Block::to_value).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use crate::wallet::generate_keypair_hex;

    /// Brute-force a nonce so the block satisfies `ledger`'s target.
    fn sealed(
        ledger: &Ledger,
        index: u64,
        txs: Vec<Transaction>,
        prev_hash: Option<String>,
    ) -> Block {
        let target = ledger.pow_target();
        (0u64..)
            .map(|nonce| Block::new(index, 1_000, txs.clone(), nonce, prev_hash.clone()))
            .find(|b| b.hash().starts_with(&target))
            .unwrap()
    }

    fn ledger() -> Ledger {
        Ledger::new(1, 1)
    }

    fn signed(sk: &str, pk: &str, to: &str, amount: u64, ts: i64) -> Transaction {
        let mut tx = Transaction::new(Some(pk.into()), to.into(), amount, ts);
        tx.sign(sk).unwrap();
        tx
    }

    #[test]
    fn empty_chain_has_no_last_block_and_zero_balance() {
        let l = ledger();
        assert!(l.last_block().is_none());
        assert!(l.is_empty());
        assert_eq!(l.compute_balance("anyone"), 0);
        assert_eq!(l.to_canonical_text(), "[]");
        assert_eq!(Ledger::default().pow_target(), "0000");
    }

    #[test]
    fn genesis_accepted_regardless_of_prev_hash() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let genesis = sealed(
            &l,
            1,
            vec![Transaction::reward("a".into(), 50, 1)],
            Some("garbage".into()),
        );
        assert!(l.validate_new_block(&genesis));
        assert!(l.add_block(Some(genesis), &mut pool));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn genesis_must_have_index_one_and_transactions() {
        let l = ledger();
        let wrong_index = sealed(&l, 2, vec![Transaction::reward("a".into(), 1, 1)], None);
        assert!(!l.validate_new_block(&wrong_index));

        let empty = sealed(&l, 1, vec![], None);
        assert!(!l.validate_new_block(&empty));
    }

    #[test]
    fn add_block_rejects_none() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        assert!(!l.add_block(None, &mut pool));
    }

    #[test]
    fn proof_of_work_is_enforced() {
        let l = Ledger::new(3, 1);
        let txs = vec![Transaction::reward("a".into(), 1, 1)];
        let weak = (0u64..)
            .map(|n| Block::new(1, 1_000, txs.clone(), n, None))
            .find(|b| !b.hash().starts_with("000"))
            .unwrap();
        assert!(!l.validate_proof_of_work(&weak));
        assert!(!l.validate_new_block(&weak));
    }

    #[test]
    fn linkage_mismatch_is_rejected() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let genesis = sealed(&l, 1, vec![Transaction::reward("a".into(), 50, 1)], None);
        assert!(l.add_block(Some(genesis), &mut pool));

        let next = sealed(
            &l,
            2,
            vec![Transaction::reward("m".into(), 1, 2)],
            Some("not-the-tip".into()),
        );
        assert!(l.validate_proof_of_work(&next));
        assert!(l.validate_transactions(&next));
        assert!(!l.add_block(Some(next), &mut pool));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn index_gap_is_rejected() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let genesis = sealed(&l, 1, vec![Transaction::reward("a".into(), 50, 1)], None);
        let tip = genesis.hash().to_string();
        assert!(l.add_block(Some(genesis), &mut pool));

        let skipped = sealed(&l, 3, vec![Transaction::reward("m".into(), 1, 2)], Some(tip));
        assert!(!l.validate_new_block(&skipped));
    }

    #[test]
    fn reward_cardinality_must_be_exactly_one() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let (sk, pk) = generate_keypair_hex();
        let genesis = sealed(&l, 1, vec![Transaction::reward(pk.clone(), 50, 1)], None);
        let tip = genesis.hash().to_string();
        assert!(l.add_block(Some(genesis), &mut pool));

        let pay = signed(&sk, &pk, "bob", 5, 2);

        let none = sealed(&l, 2, vec![pay.clone()], Some(tip.clone()));
        assert!(!l.validate_transactions(&none));

        let two = sealed(
            &l,
            2,
            vec![
                pay.clone(),
                Transaction::reward("m".into(), 1, 3),
                Transaction::reward("m".into(), 1, 4),
            ],
            Some(tip.clone()),
        );
        assert!(!l.validate_transactions(&two));

        let one = sealed(
            &l,
            2,
            vec![pay, Transaction::reward("m".into(), 1, 3)],
            Some(tip),
        );
        assert!(l.validate_transactions(&one));
        assert!(l.add_block(Some(one), &mut pool));
    }

    #[test]
    fn unsigned_transaction_rejects_the_block() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let genesis = sealed(&l, 1, vec![Transaction::reward("a".into(), 50, 1)], None);
        let tip = genesis.hash().to_string();
        assert!(l.add_block(Some(genesis), &mut pool));

        let unsigned = Transaction::new(Some("a".into()), "b".into(), 1, 2);
        let block = sealed(
            &l,
            2,
            vec![unsigned, Transaction::reward("m".into(), 1, 3)],
            Some(tip),
        );
        assert!(!l.validate_transactions(&block));
    }

    #[test]
    fn balances_replay_the_whole_chain() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let (a_sk, a) = generate_keypair_hex();
        let (b_sk, b) = generate_keypair_hex();

        // Genesis content is not checked, so it can carry A -> B directly.
        let genesis = sealed(&l, 1, vec![signed(&a_sk, &a, &b, 10, 1)], None);
        let tip = genesis.hash().to_string();
        assert!(l.add_block(Some(genesis), &mut pool));

        let second = sealed(
            &l,
            2,
            vec![
                signed(&b_sk, &b, &a, 3, 2),
                Transaction::reward("miner".into(), 1, 3),
            ],
            Some(tip),
        );
        assert!(l.add_block(Some(second), &mut pool));

        assert_eq!(l.compute_balance(&a), -7);
        assert_eq!(l.compute_balance(&b), 7);
        assert_eq!(l.compute_balance("miner"), 1);
        assert_eq!(l.compute_balance("nobody"), 0);
    }

    #[test]
    fn canonical_text_lists_blocks_with_sorted_keys() {
        let mut l = ledger();
        let mut pool = TransactionPool::new();
        let genesis = sealed(&l, 1, vec![Transaction::reward("a".into(), 50, 1)], None);
        let hash = genesis.hash().to_string();
        assert!(l.add_block(Some(genesis), &mut pool));

        let text = l.to_canonical_text();
        assert!(text.starts_with(r#"[{"hash":""#));
        assert!(text.contains(&hash));
        assert!(text.contains(r#""prevHash":null"#));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }
}
