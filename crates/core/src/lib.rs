//! Certificate fingerprinting and verification protocol.
//!
//! Issuance hashes a certificate's fields into a [`Fingerprint`], records it on
//! a [`Ledger`] and encodes a proof for the certificate's QR code. Verification
//! decodes the proof from a document and checks it against the ledger.
//!
//! This crate has no network, imaging or CLI dependencies; ledgers and proof
//! extractors are injected through the [`Ledger`] and [`ProofExtractor`] traits.

pub mod digest;
pub mod error;
pub mod extract;
pub mod fields;
pub mod fingerprint;
pub mod issue;
pub mod ledger;
pub mod proof;
pub mod trailer;
pub mod types;
pub mod verify;

pub use digest::{DigestAlgorithm, compute_digest, hex_digest};
pub use error::{Error, Result};
pub use extract::{ChainExtractor, ProofExtractor, TrailerExtractor};
pub use fields::{CertificateFields, parse_certificate_number};
pub use fingerprint::{
    FIELD_ORDER, FINGERPRINT_DIGEST, FINGERPRINT_SCHEME_VERSION, FieldHashSet, Fingerprint,
    build_fingerprint, field_hashes,
};
pub use issue::{DEFAULT_EXPLORER_TX_URL, IssueOptions, draft_proof_text, issue_certificate};
pub use ledger::{Ledger, LedgerEntry, MemoryLedger};
pub use proof::{DecodedProof, ProofRecord, decode, decode_record, encode};
pub use trailer::{embed_proof, extract_proof, looks_like_pdf, split_pdf};
pub use types::*;
pub use verify::{verify_decoded, verify_document};
