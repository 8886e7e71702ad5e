//! Common types and result structures.

use serde::{Deserialize, Serialize};

use crate::proof::{DecodedProof, ProofRecord};

pub const VALID_MESSAGE: &str = "Verified: Certificate is valid";
pub const INVALID_MESSAGE: &str = "Certificate is not valid";

/// Why a verification did not succeed.
///
/// Callers see the same [`INVALID_MESSAGE`] for every kind; the kind is for
/// logs and clients that want to tell "unreadable" from "not valid".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    /// No proof text could be extracted from the document.
    ProofUnreadable,
    /// Proof text was found but carries no certificate hash.
    ProofMissingHash,
    /// The certificate number in the proof is not an unsigned integer.
    InvalidCertificateNumber,
    /// The ledger has no record of the fingerprint.
    NotIssued,
    /// The ledger records a different certificate number.
    NumberMismatch,
    /// The ledger could not be read.
    LedgerUnavailable,
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<VerificationFailure>,
}

impl VerificationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: VALID_MESSAGE.to_string(),
            failure: None,
        }
    }

    pub fn invalid(failure: VerificationFailure) -> Self {
        Self {
            valid: false,
            reason: INVALID_MESSAGE.to_string(),
            failure: Some(failure),
        }
    }
}

/// Verification of a whole document.
///
/// `details_qr` is the raw proof text read from this document, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub result: VerificationResult,
    pub decoded: Option<DecodedProof>,
    pub details_qr: Option<String>,
}

/// A certificate recorded on the ledger, with its proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCertificate {
    pub proof: ProofRecord,
    pub proof_text: String,
    pub ledger_link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_results_share_one_message() {
        let a = VerificationResult::invalid(VerificationFailure::NotIssued);
        let b = VerificationResult::invalid(VerificationFailure::ProofUnreadable);
        assert_eq!(a.reason, b.reason);
        assert_eq!(a.reason, "Certificate is not valid");
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let result = VerificationResult::invalid(VerificationFailure::LedgerUnavailable);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failure"], "ledger_unavailable");
        assert_eq!(json["valid"], false);

        let json = serde_json::to_value(VerificationResult::valid()).unwrap();
        assert!(json.get("failure").is_none());
    }
}
