use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures the node raises instead of reporting a boolean rejection.
///
/// Semantic rejections (bad PoW, bad signature, insufficient balance, broken
/// linkage) are never errors; they come back as `false` from the ledger and pool.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A wire record whose supplied hash does not match its content.
    #[error("{kind} hash mismatch: computed {computed}, supplied {supplied}")]
    HashIntegrity {
        kind: &'static str,
        computed: String,
        supplied: String,
    },

    #[error("missing key material: {0}")]
    MissingKeyMaterial(&'static str),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("unsupported peer protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("adapter protocol mismatch: peer {peer}, adapter {adapter}")]
    AdapterProtocolMismatch { peer: String, adapter: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Transport(err.to_string())
    }
}

impl From<hex::FromHexError> for LedgerError {
    fn from(err: hex::FromHexError) -> Self {
        LedgerError::InvalidKeyMaterial(err.to_string())
    }
}

impl LedgerError {
    fn kind(&self) -> &'static str {
        match self {
            LedgerError::HashIntegrity { .. } => "HashIntegrityError",
            LedgerError::MissingKeyMaterial(_) => "MissingKeyMaterial",
            LedgerError::InvalidKeyMaterial(_) => "InvalidKeyMaterial",
            LedgerError::UnsupportedProtocol(_) => "UnsupportedProtocolError",
            LedgerError::AdapterProtocolMismatch { .. } => "AdapterProtocolMismatch",
            LedgerError::Transport(_) => "TransportError",
        }
    }
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::HashIntegrity { .. }
            | LedgerError::UnsupportedProtocol(_)
            | LedgerError::InvalidKeyMaterial(_) => StatusCode::BAD_REQUEST,
            LedgerError::Transport(_) => StatusCode::BAD_GATEWAY,
            LedgerError::MissingKeyMaterial(_) | LedgerError::AdapterProtocolMismatch { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}
