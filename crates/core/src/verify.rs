//! Verification decision against the ledger.

use crate::extract::ProofExtractor;
use crate::fields::parse_certificate_number;
use crate::ledger::Ledger;
use crate::proof::{DecodedProof, decode};
use crate::types::{VerificationFailure, VerificationReport, VerificationResult};

/// Decide whether a decoded proof matches the ledger.
///
/// Valid iff the ledger reports the fingerprint as issued under the same
/// certificate number. Every failure, including ledger errors, yields an
/// invalid result.
#[tracing::instrument(skip(decoded, ledger), fields(certificate_number = %decoded.certificate_number))]
pub async fn verify_decoded(decoded: &DecodedProof, ledger: &dyn Ledger) -> VerificationResult {
    if !decoded.has_hash() {
        tracing::warn!("Proof carries no certificate hash");
        return VerificationResult::invalid(VerificationFailure::ProofMissingHash);
    }

    let Some(expected_number) = parse_certificate_number(&decoded.certificate_number) else {
        tracing::warn!("Certificate number in proof is not numeric");
        return VerificationResult::invalid(VerificationFailure::InvalidCertificateNumber);
    };

    let entry = match ledger.verify_certificate(&decoded.certificate_hash).await {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(error = %e, "Ledger read failed, reporting certificate as not valid");
            return VerificationResult::invalid(VerificationFailure::LedgerUnavailable);
        }
    };

    let result = if !entry.issued {
        VerificationResult::invalid(VerificationFailure::NotIssued)
    } else if entry.certificate_number != expected_number {
        VerificationResult::invalid(VerificationFailure::NumberMismatch)
    } else {
        VerificationResult::valid()
    };

    tracing::info!(
        valid = result.valid,
        failure = ?result.failure,
        ledger_number = entry.certificate_number,
        "Certificate verification complete"
    );
    result
}

/// Extract, decode and verify the proof carried by a document.
///
/// Never fails: an unreadable document is reported as not valid.
#[tracing::instrument(skip(data, extractor, ledger), fields(data_len = data.len(), extractor = extractor.name()))]
pub async fn verify_document(
    data: &[u8],
    extractor: &dyn ProofExtractor,
    ledger: &dyn Ledger,
) -> VerificationReport {
    let text = match extractor.extract(data) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "No proof could be extracted");
            return VerificationReport {
                result: VerificationResult::invalid(VerificationFailure::ProofUnreadable),
                decoded: None,
                details_qr: None,
            };
        }
    };

    let decoded = decode(&text);
    tracing::debug!(
        certificate_hash = %decoded.certificate_hash,
        certificate_number = %decoded.certificate_number,
        "Decoded proof"
    );

    let result = verify_decoded(&decoded, ledger).await;
    VerificationReport {
        result,
        decoded: Some(decoded),
        details_qr: Some(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::extract::TrailerExtractor;
    use crate::ledger::{LedgerEntry, MemoryLedger};
    use crate::trailer::embed_proof;
    use crate::types::{INVALID_MESSAGE, VALID_MESSAGE};
    use async_trait::async_trait;

    struct StaticLedger(LedgerEntry);

    #[async_trait]
    impl Ledger for StaticLedger {
        async fn verify_certificate(&self, _hash: &str) -> Result<LedgerEntry> {
            Ok(self.0)
        }

        async fn issue_certificate(&self, _number: u64, _hash: &str) -> Result<String> {
            Err(Error::Ledger("read-only".into()))
        }
    }

    struct DownLedger;

    #[async_trait]
    impl Ledger for DownLedger {
        async fn verify_certificate(&self, _hash: &str) -> Result<LedgerEntry> {
            Err(Error::Ledger("connection refused".into()))
        }

        async fn issue_certificate(&self, _number: u64, _hash: &str) -> Result<String> {
            Err(Error::Ledger("connection refused".into()))
        }
    }

    fn ledger(issued: bool, certificate_number: u64) -> StaticLedger {
        StaticLedger(LedgerEntry {
            issued,
            certificate_number,
        })
    }

    fn proof() -> DecodedProof {
        decode("Certificate Hash: abc123\nCertificate Number: 123")
    }

    #[tokio::test]
    async fn matching_entry_is_valid() {
        let result = verify_decoded(&proof(), &ledger(true, 123)).await;
        assert!(result.valid);
        assert_eq!(result.reason, VALID_MESSAGE);
    }

    #[tokio::test]
    async fn different_number_is_invalid() {
        let result = verify_decoded(&proof(), &ledger(true, 999)).await;
        assert!(!result.valid);
        assert_eq!(result.failure, Some(VerificationFailure::NumberMismatch));
    }

    #[tokio::test]
    async fn unissued_entry_is_invalid() {
        let result = verify_decoded(&proof(), &ledger(false, 123)).await;
        assert!(!result.valid);
        assert_eq!(result.failure, Some(VerificationFailure::NotIssued));
    }

    #[tokio::test]
    async fn non_numeric_number_is_invalid() {
        let decoded = decode("Certificate Hash: abc123\nCertificate Number: CERT-123");
        let result = verify_decoded(&decoded, &ledger(true, 123)).await;
        assert_eq!(
            result.failure,
            Some(VerificationFailure::InvalidCertificateNumber)
        );
    }

    #[tokio::test]
    async fn numbers_compare_numerically() {
        let decoded = decode("Certificate Hash: abc123\nCertificate Number: 00123");
        assert!(verify_decoded(&decoded, &ledger(true, 123)).await.valid);
    }

    #[tokio::test]
    async fn missing_hash_skips_ledger() {
        let result = verify_decoded(&DecodedProof::default(), &DownLedger).await;
        assert_eq!(result.failure, Some(VerificationFailure::ProofMissingHash));
    }

    #[tokio::test]
    async fn ledger_failure_is_invalid() {
        let result = verify_decoded(&proof(), &DownLedger).await;
        assert!(!result.valid);
        assert_eq!(result.reason, INVALID_MESSAGE);
        assert_eq!(result.failure, Some(VerificationFailure::LedgerUnavailable));
    }

    #[tokio::test]
    async fn document_without_proof_is_invalid() {
        let report = verify_document(b"%PDF-1.4\n%%EOF", &TrailerExtractor, &ledger(true, 123)).await;
        assert!(!report.result.valid);
        assert_eq!(report.result.reason, INVALID_MESSAGE);
        assert_eq!(report.details_qr, None);
    }

    #[tokio::test]
    async fn document_with_proof_echoes_its_own_text() {
        let text = "Certificate Hash: abc123\nCertificate Number: 123";
        let pdf = embed_proof(b"%PDF-1.4\n%%EOF", text).unwrap();
        let ledger = MemoryLedger::with_entries([("abc123", 123)]);

        let report = verify_document(&pdf, &TrailerExtractor, &ledger).await;
        assert!(report.result.valid);
        assert_eq!(report.details_qr.as_deref(), Some(text));
        assert_eq!(report.decoded, Some(proof()));
    }
}
