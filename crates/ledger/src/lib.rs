//! JSON-RPC ledger backend for the certificate registry contract.

pub mod registry;
pub mod rpc;

pub use rpc::{LedgerEndpoints, RpcLedger};

/// Default public endpoints and transaction parameters.
pub const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
