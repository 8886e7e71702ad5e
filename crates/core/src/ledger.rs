//! Ledger port: where issued fingerprints are recorded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::digest::{DigestAlgorithm, hex_digest};
use crate::error::{Error, Result};

/// Ledger state for one fingerprint.
///
/// An unknown fingerprint reads as `issued: false, certificate_number: 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub issued: bool,
    pub certificate_number: u64,
}

/// Read and write access to the certificate registry.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Look up a fingerprint.
    async fn verify_certificate(&self, certificate_hash: &str) -> Result<LedgerEntry>;

    /// Record a fingerprint. Returns the transaction identifier.
    async fn issue_certificate(&self, certificate_number: u64, certificate_hash: &str)
    -> Result<String>;
}

/// In-process ledger.
///
/// Entries are immutable once written, like the on-chain registry.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<String, u64>>,
    sequence: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-populated with `(certificate_hash, certificate_number)` entries.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let entries = entries.into_iter().map(|(h, n)| (h.into(), n)).collect();
        Self {
            entries: Mutex::new(entries),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn verify_certificate(&self, certificate_hash: &str) -> Result<LedgerEntry> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Ledger("ledger state poisoned".into()))?;
        Ok(match entries.get(certificate_hash) {
            Some(&certificate_number) => LedgerEntry {
                issued: true,
                certificate_number,
            },
            None => LedgerEntry::default(),
        })
    }

    async fn issue_certificate(
        &self,
        certificate_number: u64,
        certificate_hash: &str,
    ) -> Result<String> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Ledger("ledger state poisoned".into()))?;
        if entries.contains_key(certificate_hash) {
            return Err(Error::Ledger(format!(
                "registry rejected write: {} is already recorded",
                certificate_hash
            )));
        }
        entries.insert(certificate_hash.to_string(), certificate_number);

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let preimage = format!("{}:{}:{}", seq, certificate_number, certificate_hash);
        let tx_hash = format!("0x{}", hex_digest(DigestAlgorithm::Sha256, preimage.as_bytes()));
        tracing::debug!(%tx_hash, certificate_number, "Recorded certificate in memory ledger");
        Ok(tx_hash)
    }
}
