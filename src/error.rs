use thiserror::Error;
use ticketkit::{FlowError, KeystoreError, TicketError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),

    #[error("interrupted")]
    Interrupted,
}
