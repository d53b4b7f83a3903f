use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::canonical;
use crate::error::{LedgerError, Result};
use crate::transaction::{Transaction, TransactionRecord};

/// Wire form of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<TransactionRecord>,
    pub nonce: u64,
    #[serde(default)]
    pub prev_hash: Option<String>,
    pub hash: String,
}

/// A single block in the chain holding an ordered list of transactions.
#[derive(Debug, Clone)]
pub struct Block {
    index: u64,
    timestamp: i64, // Unix timestamp (UTC)
    transactions: Vec<Transaction>,
    nonce: u64, // Proof-of-Work nonce
    prev_hash: Option<String>,
    hash: String,
    from_peer: bool,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: i64,
        transactions: Vec<Transaction>,
        nonce: u64,
        prev_hash: Option<String>,
    ) -> Self {
        let tx_values = Self::transaction_values(&transactions);
        let hash = Self::hash_parts(index, timestamp, &tx_values, nonce, prev_hash.as_deref());
        Self {
            index,
            timestamp,
            transactions,
            nonce,
            prev_hash,
            hash,
            from_peer: false,
        }
    }

    /// Each transaction enters the preimage as its full serialized record, so
    /// the transaction signatures are covered by the block hash.
    pub(crate) fn transaction_values(transactions: &[Transaction]) -> Value {
        Value::Array(transactions.iter().map(Transaction::to_value).collect())
    }

    /// Block hash from its parts. The miner calls this directly to avoid
    /// re-serializing the transactions on every nonce.
    pub(crate) fn hash_parts(
        index: u64,
        timestamp: i64,
        transactions: &Value,
        nonce: u64,
        prev_hash: Option<&str>,
    ) -> String {
        canonical::hash(&json!({
            "index": index,
            "timestamp": timestamp,
            "transactions": transactions,
            "nonce": nonce,
            "prevHash": prev_hash,
        }))
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn prev_hash(&self) -> Option<&str> {
        self.prev_hash.as_deref()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_from_peer(&self) -> bool {
        self.from_peer
    }

    pub fn mark_from_peer(&mut self) {
        self.from_peer = true;
    }

    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            index: self.index,
            timestamp: self.timestamp,
            transactions: self.transactions.iter().map(Transaction::to_record).collect(),
            nonce: self.nonce,
            prev_hash: self.prev_hash.clone(),
            hash: self.hash.clone(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "transactions": Self::transaction_values(&self.transactions),
            "nonce": self.nonce,
            "prevHash": self.prev_hash,
            "hash": self.hash,
        })
    }

    /// Rebuild from the wire. Every nested transaction is integrity-checked
    /// first, then the block hash itself.
    pub fn from_record(record: BlockRecord) -> Result<Self> {
        let BlockRecord {
            index,
            timestamp,
            transactions,
            nonce,
            prev_hash,
            hash,
        } = record;

        let transactions = transactions
            .into_iter()
            .map(Transaction::from_record)
            .collect::<Result<Vec<_>>>()?;

        let block = Self::new(index, timestamp, transactions, nonce, prev_hash);
        if block.hash != hash {
            return Err(LedgerError::HashIntegrity {
                kind: "Block",
                computed: block.hash,
                supplied: hash,
            });
        }
        Ok(block)
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl Eq for Block {}
