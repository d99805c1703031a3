pub mod receipt;
pub mod token;
pub mod transaction;

pub use receipt::{TransactionOutcome, TransactionReceipt};
pub use token::{BalanceReport, TokenDetails};
pub use transaction::{Direction, RpcTransactionRequest, TransactionIntent};
