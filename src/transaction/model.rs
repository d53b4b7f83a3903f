use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::canonical;
use crate::error::{LedgerError, Result};
use crate::wallet::{sign_hex, verify_hex};

/// Wire form of a transaction. Runtime flags never travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub sender: Option<String>,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: i64,
    pub hash: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A transfer of `amount` from `sender` to `recipient`.
///
/// A transaction without a sender is a system reward (mining reward or
/// airdrop) and is trusted without a signature. Core fields are fixed at
/// construction; only the signature and the two runtime flags can change.
#[derive(Debug, Clone)]
pub struct Transaction {
    sender: Option<String>,
    recipient: String,
    amount: u64,
    timestamp: i64,
    hash: String,
    signature: Option<String>,
    confirmed: bool,
    from_peer: bool,
}

impl Transaction {
    pub fn new(sender: Option<String>, recipient: String, amount: u64, timestamp: i64) -> Self {
        let hash = Self::compute_hash(sender.as_deref(), &recipient, amount, timestamp);
        Self {
            sender,
            recipient,
            amount,
            timestamp,
            hash,
            signature: None,
            confirmed: false,
            from_peer: false,
        }
    }

    /// Reward-shaped transaction minted by the node itself.
    pub fn reward(recipient: String, amount: u64, timestamp: i64) -> Self {
        Self::new(None, recipient, amount, timestamp)
    }

    fn compute_hash(sender: Option<&str>, recipient: &str, amount: u64, timestamp: i64) -> String {
        canonical::hash(&json!({
            "sender": sender,
            "recipient": recipient,
            "amount": amount,
            "timestamp": timestamp,
        }))
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_from_peer(&self) -> bool {
        self.from_peer
    }

    /// Only the pool flips this, when an accepted block carries our hash.
    pub(crate) fn mark_confirmed(&mut self) {
        self.confirmed = true;
    }

    pub fn mark_from_peer(&mut self) {
        self.from_peer = true;
    }

    /// Sign the UTF-8 bytes of the hash with a hex secp256k1 private key.
    pub fn sign(&mut self, private_key_hex: &str) -> Result<()> {
        self.signature = Some(sign_hex(Some(private_key_hex), self.hash.as_bytes())?);
        Ok(())
    }

    pub fn verify_signature(&self) -> bool {
        let Some(sender) = self.sender.as_deref() else {
            return true;
        };
        let Some(signature) = self.signature.as_deref() else {
            return false;
        };
        verify_hex(Some(sender), signature, self.hash.as_bytes()).unwrap_or(false)
    }

    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            amount: self.amount,
            timestamp: self.timestamp,
            hash: self.hash.clone(),
            signature: self.signature.clone(),
        }
    }

    /// Serialized record as a JSON value; this is what a block hashes.
    pub fn to_value(&self) -> Value {
        json!({
            "sender": self.sender,
            "recipient": self.recipient,
            "amount": self.amount,
            "timestamp": self.timestamp,
            "hash": self.hash,
            "signature": self.signature,
        })
    }

    /// Rebuild from the wire, refusing records whose hash does not match.
    pub fn from_record(record: TransactionRecord) -> Result<Self> {
        let TransactionRecord {
            sender,
            recipient,
            amount,
            timestamp,
            hash,
            signature,
        } = record;

        let mut tx = Self::new(sender, recipient, amount, timestamp);
        if tx.hash != hash {
            return Err(LedgerError::HashIntegrity {
                kind: "Transaction",
                computed: tx.hash,
                supplied: hash,
            });
        }
        tx.signature = signature;
        Ok(tx)
    }
}

/// Equality is over persisted fields; runtime flags are process-local.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl Eq for Transaction {}
