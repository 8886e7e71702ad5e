//! TOML configuration for the certproof CLI and server.

use anyhow::{Context, Result, bail};
use certproof_core::DEFAULT_EXPLORER_TX_URL;
use certproof_ledger::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_GAS_LIMIT, DEFAULT_RPC_URL, DEFAULT_TIMEOUT_SECS,
    LedgerEndpoints,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::cli::LedgerArgs;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Registry contract connection.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Registry contract address.
    #[serde(default)]
    pub contract_address: Option<String>,
    /// Node-managed account used for writes.
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Seconds to wait for an issuance to be mined (0 = don't wait).
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Prefix joined with the transaction hash to build the ledger link.
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: None,
            from_address: None,
            gas_limit: default_gas_limit(),
            timeout_secs: default_timeout_secs(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            explorer_tx_url: default_explorer_tx_url(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted upload, in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_confirmation_timeout_secs() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}

fn default_explorer_tx_url() -> String {
    DEFAULT_EXPLORER_TX_URL.to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_max_upload_mb() -> usize {
    20
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).context("Invalid configuration TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("In config file {}", path.display()))
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let rpc = &self.ledger.rpc_url;
        if !(rpc.starts_with("http://") || rpc.starts_with("https://")) {
            bail!("ledger.rpc_url must be an http(s) URL, got '{}'", rpc);
        }
        if self.ledger.gas_limit == 0 {
            bail!("ledger.gas_limit must be greater than zero");
        }
        if self.ledger.timeout_secs == 0 {
            bail!("ledger.timeout_secs must be greater than zero");
        }
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("server.bind is not a socket address: {}", self.server.bind))?;
        if self.server.max_upload_mb == 0 {
            bail!("server.max_upload_mb must be greater than zero");
        }
        Ok(())
    }

    /// Ledger endpoints with command-line overrides applied.
    pub fn ledger_endpoints(&self, args: &LedgerArgs) -> Result<LedgerEndpoints> {
        let rpc_url = args
            .rpc_url
            .clone()
            .unwrap_or_else(|| self.ledger.rpc_url.clone());
        let contract = args
            .contract
            .clone()
            .or_else(|| self.ledger.contract_address.clone())
            .context("No registry contract configured (set ledger.contract_address or pass --contract)")?;

        let mut endpoints = LedgerEndpoints::new(rpc_url, contract);
        endpoints.from_address = args
            .from
            .clone()
            .or_else(|| self.ledger.from_address.clone());
        endpoints.gas_limit = self.ledger.gas_limit;
        endpoints.timeout = Duration::from_secs(self.ledger.timeout_secs);
        endpoints.confirmation_timeout = Duration::from_secs(self.ledger.confirmation_timeout_secs);
        Ok(endpoints)
    }
}
