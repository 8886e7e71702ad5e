//! Digest (hash) abstraction used by the fingerprint scheme.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DigestAlgorithm {
    Sha256 = 1,
}

impl DigestAlgorithm {
    /// Returns the algorithm name in lowercase.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

/// Compute digest of the given data using the specified algorithm.
#[tracing::instrument(level = "trace", skip(data), fields(data_len = data.len(), alg = ?algorithm))]
pub fn compute_digest(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            hasher.finalize().to_vec()
        }
    }
}

/// Compute digest and render it as lowercase hex.
pub fn hex_digest(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    hex::encode(compute_digest(algorithm, data))
}
