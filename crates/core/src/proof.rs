//! Proof text codec.
//!
//! A proof is newline-delimited `Key: Value` text that is rendered into the
//! certificate's QR code. Verification only needs two of its keys,
//! `Certificate Hash` and `Certificate Number`.
//!
//! Commas are stripped from values when decoding, so a value containing a
//! comma does not survive a round trip. The encoder removes commas up front
//! instead of relying on them.

use serde::{Deserialize, Serialize};

use crate::fields::CertificateFields;
use crate::fingerprint::Fingerprint;

pub const TRANSACTION_HASH_KEY: &str = "Transaction Hash";
pub const CERTIFICATE_HASH_KEY: &str = "Certificate Hash";
pub const CERTIFICATE_NUMBER_KEY: &str = "Certificate Number";
pub const NAME_KEY: &str = "Name";
pub const COURSE_NAME_KEY: &str = "Course Name";
pub const GRANT_DATE_KEY: &str = "Grant Date";
pub const EXPIRATION_DATE_KEY: &str = "Expiration Date";

/// Everything embedded in a certificate's QR code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    #[serde(rename = "Transaction_Hash")]
    pub transaction_hash: String,
    #[serde(rename = "Certificate_Hash")]
    pub certificate_hash: String,
    #[serde(rename = "Certificate_Number")]
    pub certificate_number: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Course_Name")]
    pub course_name: String,
    #[serde(rename = "Grant_Date")]
    pub grant_date: String,
    #[serde(rename = "Expiration_Date")]
    pub expiration_date: String,
}

impl ProofRecord {
    pub fn new(fields: &CertificateFields, fingerprint: &Fingerprint, transaction_hash: &str) -> Self {
        Self {
            transaction_hash: transaction_hash.to_string(),
            certificate_hash: fingerprint.as_str().to_string(),
            certificate_number: fields.certificate_number.clone(),
            name: fields.name.clone(),
            course_name: fields.course_name.clone(),
            grant_date: fields.grant_date.clone(),
            expiration_date: fields.expiration_date.clone(),
        }
    }
}

/// The two proof values needed to re-verify a certificate.
///
/// An empty `certificate_hash` means no proof was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedProof {
    #[serde(rename = "Certificate_Hash")]
    pub certificate_hash: String,
    #[serde(rename = "Certificate_Number")]
    pub certificate_number: String,
}

impl DecodedProof {
    pub fn has_hash(&self) -> bool {
        !self.certificate_hash.is_empty()
    }
}

fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != ',')
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Encode a proof as QR payload text.
///
/// The layout (quoted transaction hash, trailing commas) matches proofs
/// printed on certificates already in circulation; the decoder ignores both.
pub fn encode(proof: &ProofRecord) -> String {
    let lines = [
        format!(
            "{}: \"{}\"",
            TRANSACTION_HASH_KEY,
            sanitize_value(&proof.transaction_hash)
        ),
        format!("{}: {}", CERTIFICATE_HASH_KEY, sanitize_value(&proof.certificate_hash)),
        format!(
            "{}: {}",
            CERTIFICATE_NUMBER_KEY,
            sanitize_value(&proof.certificate_number)
        ),
        format!("{}: {}", NAME_KEY, sanitize_value(&proof.name)),
        format!("{}: {}", COURSE_NAME_KEY, sanitize_value(&proof.course_name)),
        format!("{}: {}", GRANT_DATE_KEY, sanitize_value(&proof.grant_date)),
        format!(
            "{}: {}",
            EXPIRATION_DATE_KEY,
            sanitize_value(&proof.expiration_date)
        ),
    ];
    lines.join(",\n")
}

/// Split a proof line into `(key, value)`.
///
/// Lines that do not split into exactly two colon-delimited parts are not
/// key/value lines. Commas are removed from the value.
fn split_line(line: &str) -> Option<(&str, String)> {
    let mut parts = line.trim().split(':');
    let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    Some((key.trim(), value.trim().replace(',', "")))
}

/// Decode the hash and certificate number from proof text.
///
/// Never fails: unrecognised keys and malformed lines are skipped, and text
/// without either key decodes to empty strings.
#[tracing::instrument(skip(text), fields(text_len = text.len()))]
pub fn decode(text: &str) -> DecodedProof {
    let mut decoded = DecodedProof::default();
    for (key, value) in text.lines().filter_map(split_line) {
        match key {
            CERTIFICATE_HASH_KEY => decoded.certificate_hash = value,
            CERTIFICATE_NUMBER_KEY => decoded.certificate_number = value,
            _ => {}
        }
    }
    if !decoded.has_hash() {
        tracing::debug!("Proof text contains no certificate hash");
    }
    decoded
}

/// Best-effort reconstruction of the full record from proof text.
pub fn decode_record(text: &str) -> ProofRecord {
    let mut record = ProofRecord::default();
    for (key, value) in text.lines().filter_map(split_line) {
        match key {
            TRANSACTION_HASH_KEY => record.transaction_hash = value.trim_matches('"').to_string(),
            CERTIFICATE_HASH_KEY => record.certificate_hash = value,
            CERTIFICATE_NUMBER_KEY => record.certificate_number = value,
            NAME_KEY => record.name = value,
            COURSE_NAME_KEY => record.course_name = value,
            GRANT_DATE_KEY => record.grant_date = value,
            EXPIRATION_DATE_KEY => record.expiration_date = value,
            _ => {}
        }
    }
    record
}
