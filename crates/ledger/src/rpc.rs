//! Ethereum JSON-RPC ledger.
//!
//! Reads use `eth_call`. Writes use `eth_sendTransaction` from an account
//! managed by the node, then poll for the receipt; this crate never handles
//! private keys.

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::{Http, reqwest};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use certproof_core::{Error as LedgerError, Ledger, LedgerEntry};
use std::time::Duration;
use tokio::time::Instant;

use crate::registry::{CertificateRegistry, certificate_number, parse_address};

/// Connection settings for the registry contract.
#[derive(Debug, Clone)]
pub struct LedgerEndpoints {
    pub rpc_url: String,
    pub contract_address: String,
    /// Node-managed account used for writes. Reads work without it.
    pub from_address: Option<String>,
    pub gas_limit: u64,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// How long to wait for a write to be mined. Zero skips the wait.
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl LedgerEndpoints {
    pub fn new(rpc_url: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            contract_address: contract_address.into(),
            from_address: None,
            gas_limit: crate::DEFAULT_GAS_LIMIT,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            confirmation_timeout: Duration::from_secs(crate::DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Ledger backed by the registry contract over JSON-RPC.
pub struct RpcLedger {
    provider: DynProvider,
    registry: CertificateRegistry::CertificateRegistryInstance<DynProvider>,
    from_address: Option<Address>,
    gas_limit: u64,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(endpoints: LedgerEndpoints) -> Result<Self> {
        let contract_address =
            parse_address(&endpoints.contract_address).context("Invalid contract address")?;
        let from_address = endpoints
            .from_address
            .as_deref()
            .map(parse_address)
            .transpose()
            .context("Invalid sender address")?;

        let url: reqwest::Url = endpoints
            .rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", endpoints.rpc_url))?;
        let client = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let rpc = RpcClient::new(Http::with_client(client, url), false);

        // The node fills nonce, fees and signature for eth_sendTransaction.
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(rpc)
            .erased();
        let registry = CertificateRegistry::new(contract_address, provider.clone());

        tracing::debug!(
            rpc_url = %endpoints.rpc_url,
            contract = %contract_address,
            "Connected registry contract"
        );
        Ok(Self {
            provider,
            registry,
            from_address,
            gas_limit: endpoints.gas_limit,
            confirmation_timeout: endpoints.confirmation_timeout,
            poll_interval: endpoints.poll_interval,
        })
    }

    async fn lookup(&self, certificate_hash: &str) -> Result<LedgerEntry> {
        let ret = self
            .registry
            .verifyCertificate(certificate_hash.to_string())
            .call()
            .await
            .context("verifyCertificate call failed")?;
        Ok(LedgerEntry {
            issued: ret.issued,
            certificate_number: certificate_number(ret.certificateNumber)?,
        })
    }

    async fn submit(&self, number: u64, certificate_hash: &str) -> Result<TxHash> {
        let from = self
            .from_address
            .context("No sender account configured for ledger writes")?;
        let pending = self
            .registry
            .issueCertificate(U256::from(number), certificate_hash.to_string())
            .from(from)
            .gas(self.gas_limit)
            .send()
            .await
            .context("issueCertificate transaction was not accepted")?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<()> {
        if self.confirmation_timeout.is_zero() {
            return Ok(());
        }
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .context("eth_getTransactionReceipt failed")?;
            if let Some(receipt) = receipt {
                if !ReceiptResponse::status(&receipt) {
                    bail!("Transaction {} reverted", tx_hash);
                }
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!(
                    "Transaction {} not mined within {:?}",
                    tx_hash,
                    self.confirmation_timeout
                );
            }
            tracing::debug!(%tx_hash, "Waiting for transaction receipt");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn ledger_error(e: anyhow::Error) -> LedgerError {
    LedgerError::Ledger(format!("{:#}", e))
}

#[async_trait]
impl Ledger for RpcLedger {
    #[tracing::instrument(skip(self))]
    async fn verify_certificate(&self, certificate_hash: &str) -> certproof_core::Result<LedgerEntry> {
        let entry = self.lookup(certificate_hash).await.map_err(ledger_error)?;
        tracing::debug!(
            issued = entry.issued,
            certificate_number = entry.certificate_number,
            "Registry lookup"
        );
        Ok(entry)
    }

    #[tracing::instrument(skip(self))]
    async fn issue_certificate(
        &self,
        certificate_number: u64,
        certificate_hash: &str,
    ) -> certproof_core::Result<String> {
        let tx_hash = self
            .submit(certificate_number, certificate_hash)
            .await
            .map_err(ledger_error)?;
        tracing::info!(%tx_hash, "Submitted issueCertificate transaction");
        self.wait_for_receipt(tx_hash).await.map_err(ledger_error)?;
        Ok(tx_hash.to_string())
    }
}
