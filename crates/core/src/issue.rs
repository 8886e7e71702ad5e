//! Certificate issuance: fingerprint, record on the ledger, build the proof.

use crate::error::{Error, Result};
use crate::fields::CertificateFields;
use crate::fingerprint::build_fingerprint;
use crate::ledger::Ledger;
use crate::proof::{ProofRecord, encode};
use crate::types::IssuedCertificate;

/// Default block explorer prefix for transaction links.
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://polygonscan.com/tx/";

/// Options for issuance.
#[derive(Debug, Clone)]
pub struct IssueOptions {
    /// Prefix joined with the transaction hash to form the ledger link.
    pub explorer_tx_url: String,
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
        }
    }
}

/// Stand-in transaction hash with the length of a real one.
const DRAFT_TX_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Proof text the certificate will carry, with a zero transaction hash.
///
/// Sized like the final proof, so checks that depend on its length (QR
/// capacity) can run before anything is written to the ledger.
pub fn draft_proof_text(fields: &CertificateFields) -> Result<String> {
    fields.numeric_certificate_number()?;
    let proof = ProofRecord::new(fields, &build_fingerprint(fields), DRAFT_TX_HASH);
    Ok(encode(&proof))
}

/// Issue a certificate.
///
/// Declined with [`Error::AlreadyIssued`] when the fingerprint is already on
/// the ledger, and with [`Error::InvalidInput`] when the certificate number
/// cannot be stored as an unsigned integer.
#[tracing::instrument(skip(fields, ledger, options), fields(certificate_number = %fields.certificate_number))]
pub async fn issue_certificate(
    fields: &CertificateFields,
    ledger: &dyn Ledger,
    options: &IssueOptions,
) -> Result<IssuedCertificate> {
    let fingerprint = build_fingerprint(fields);
    let number = fields.numeric_certificate_number()?;

    let existing = ledger.verify_certificate(fingerprint.as_str()).await?;
    if existing.issued {
        tracing::info!(
            fingerprint = %fingerprint,
            ledger_number = existing.certificate_number,
            "Fingerprint already on ledger, declining"
        );
        return Err(Error::AlreadyIssued);
    }

    tracing::debug!("Recording fingerprint on ledger");
    let tx_hash = ledger
        .issue_certificate(number, fingerprint.as_str())
        .await?;

    let proof = ProofRecord::new(fields, &fingerprint, &tx_hash);
    let proof_text = encode(&proof);
    let ledger_link = format!("{}{}", options.explorer_tx_url, tx_hash);

    tracing::info!(fingerprint = %fingerprint, %tx_hash, "Certificate issued");
    Ok(IssuedCertificate {
        proof,
        proof_text,
        ledger_link,
    })
}
