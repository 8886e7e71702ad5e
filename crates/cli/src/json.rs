//! JSON output formats.

use certproof_core::{FieldHashSet, ProofRecord, VerificationFailure};
use serde::Serialize;

#[derive(Serialize)]
pub struct FingerprintJson<'a> {
    pub status: &'a str,
    pub command: &'a str,
    pub scheme_version: u32,
    pub algorithm: &'a str,
    pub field_hashes: FieldHashSet,
    pub fingerprint: String,
}

#[derive(Serialize)]
pub struct IssueJson<'a> {
    pub status: &'a str,
    pub command: &'a str,
    pub details: ProofRecord,
    pub proof_text: String,
    pub ledger_link: String,
    pub qr_out: Option<String>,
    pub output: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyJson<'a> {
    pub status: &'a str,
    pub command: &'a str,
    pub input: String,
    pub valid: bool,
    pub message: String,
    pub failure: Option<VerificationFailure>,
    pub details_qr: Option<String>,
    pub details: Option<ProofRecord>,
}

#[derive(Serialize)]
pub struct ErrorJson<'a> {
    pub status: &'a str,
    pub error: String,
    pub causes: Vec<String>,
}
