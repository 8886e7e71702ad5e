//! Deterministic certificate fingerprint.
//!
//! Scheme version 1:
//!
//! 1. Hash each field value (SHA-256, lowercase hex) in [`FIELD_ORDER`].
//! 2. Serialize the per-field hashes as a compact JSON object whose keys are
//!    the field wire names in [`FIELD_ORDER`]:
//!    `{"Certificate_Number":"<hex>","name":"<hex>",...}`.
//! 3. Hash that serialization. The result is the fingerprint the ledger is
//!    keyed on.
//!
//! Changing the algorithm, the order or the serialization changes every
//! fingerprint already on the ledger, so any such change needs a new scheme
//! version.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::{DigestAlgorithm, hex_digest};
use crate::fields::CertificateFields;

/// Version of the fingerprint scheme implemented here.
pub const FINGERPRINT_SCHEME_VERSION: u32 = 1;

/// Digest algorithm used for field hashes and the combined hash.
pub const FINGERPRINT_DIGEST: DigestAlgorithm = DigestAlgorithm::Sha256;

/// Field wire names in hashing order.
pub const FIELD_ORDER: [&str; 5] = [
    "Certificate_Number",
    "name",
    "courseName",
    "Grant_Date",
    "Expiration_Date",
];

/// Per-field hashes, keyed by field wire name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldHashSet {
    #[serde(rename = "Certificate_Number")]
    pub certificate_number: String,
    pub name: String,
    #[serde(rename = "courseName")]
    pub course_name: String,
    #[serde(rename = "Grant_Date")]
    pub grant_date: String,
    #[serde(rename = "Expiration_Date")]
    pub expiration_date: String,
}

impl FieldHashSet {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            (FIELD_ORDER[0], self.certificate_number.as_str()),
            (FIELD_ORDER[1], self.name.as_str()),
            (FIELD_ORDER[2], self.course_name.as_str()),
            (FIELD_ORDER[3], self.grant_date.as_str()),
            (FIELD_ORDER[4], self.expiration_date.as_str()),
        ]
    }

    /// Canonical serialization hashed into the fingerprint.
    ///
    /// Values are hex digests, so no JSON escaping is ever needed.
    pub fn canonical_json(&self) -> String {
        let body = self
            .entries()
            .iter()
            .map(|(key, value)| format!("\"{}\":\"{}\"", key, value))
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{}}}", body)
    }
}

/// Combined hash identifying a set of certificate fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_str(value: &str) -> String {
    hex_digest(FINGERPRINT_DIGEST, value.as_bytes())
}

/// Hash every field value individually.
pub fn field_hashes(fields: &CertificateFields) -> FieldHashSet {
    FieldHashSet {
        certificate_number: hash_str(&fields.certificate_number),
        name: hash_str(&fields.name),
        course_name: hash_str(&fields.course_name),
        grant_date: hash_str(&fields.grant_date),
        expiration_date: hash_str(&fields.expiration_date),
    }
}

/// Build the fingerprint for the given fields. Pure and deterministic.
#[tracing::instrument(skip(fields), fields(certificate_number = %fields.certificate_number))]
pub fn build_fingerprint(fields: &CertificateFields) -> Fingerprint {
    let hashes = field_hashes(fields);
    let fingerprint = Fingerprint(hash_str(&hashes.canonical_json()));
    tracing::debug!(fingerprint = %fingerprint, "Computed certificate fingerprint");
    fingerprint
}
