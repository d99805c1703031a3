pub mod admin;
pub mod config;
pub mod contract;
pub mod error;
pub mod flow;
pub mod keystore;
pub mod rpc;
pub mod signer;
pub mod types;
pub mod utils;
pub mod wallet;

// ---- Top-level re-exports for ergonomic usage ----

// Client + config
pub use config::TicketConfig;
pub use contract::ContractClient;
pub use error::{Result, TicketError};

// Flow controller
pub use flow::{
    build_intent, check_sufficient_funds, validate_ticket_count, FlowError, FlowState,
    IdentitySource, Session, TicketFlowController, MAX_TICKETS_PER_PURCHASE,
};

// JSON-RPC transport
pub use rpc::JsonRpcClient;

// Signing
pub use signer::{HostedSigner, IdentityKind, LocalSigner, Signer};

// Keystore + wallets
pub use keystore::{DecryptedAccount, KeystoreError, KeystoreFile};
pub use wallet::{create_wallet, decrypt_wallet, CreatedWallet};

// Data types
pub use types::{
    BalanceReport, Direction, TokenDetails, TransactionIntent, TransactionOutcome,
    TransactionReceipt,
};

// Units
pub use utils::{format_ether, parse_ether};
