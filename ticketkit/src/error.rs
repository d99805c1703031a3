use thiserror::Error;

use crate::keystore::KeystoreError;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("keystore error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, TicketError>;
