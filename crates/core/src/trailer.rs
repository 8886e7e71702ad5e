//! Proof trailer: the proof text appended to a PDF after its final `%%EOF`.
//!
//! ```text
//! -----BEGIN CERTIFICATE PROOF-----
//! <base64 of the UTF-8 proof text, wrapped at 76 columns>
//! -----END CERTIFICATE PROOF-----
//! ```
//!
//! PDF readers ignore bytes after `%%EOF`, so the document renders as before.
//! A later incremental save appends a new `%%EOF` and hides the trailer.

use base64::Engine;

use crate::error::{Error, Result};

const PROOF_BEGIN: &[u8] = b"-----BEGIN CERTIFICATE PROOF-----";
const PROOF_END: &[u8] = b"-----END CERTIFICATE PROOF-----";
const EOF_MARKER: &[u8] = b"%%EOF";

/// Returns true when the data starts like a PDF file.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
}

/// Split a PDF into the document up to its last `%%EOF` and the bytes after it.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn split_pdf(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let end = data
        .windows(EOF_MARKER.len())
        .rposition(|w| w == EOF_MARKER)
        .ok_or_else(|| Error::Extraction("PDF does not contain %%EOF marker".into()))?;
    Ok(data.split_at(end + EOF_MARKER.len()))
}

/// Encode proof text as a trailer block.
pub fn encode_proof_trailer(text: &str) -> Vec<u8> {
    let b64 = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());

    let mut out = Vec::new();
    out.extend_from_slice(PROOF_BEGIN);
    out.push(b'\n');
    for chunk in b64.as_bytes().chunks(76) {
        out.extend_from_slice(chunk);
        out.push(b'\n');
    }
    out.extend_from_slice(PROOF_END);
    out.push(b'\n');
    out
}

/// Parse all proof trailer blocks from the bytes after `%%EOF`.
///
/// Returns proof texts in the order they appear.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn parse_proof_trailers(data: &[u8]) -> Result<Vec<String>> {
    let mut proofs = Vec::new();
    let mut i = 0;

    while let Some(begin) = find_subslice(data, PROOF_BEGIN, i) {
        let body_start = begin + PROOF_BEGIN.len();
        let Some(end) = find_subslice(data, PROOF_END, body_start) else {
            return Err(Error::Extraction("unterminated certificate proof block".into()));
        };

        let body = std::str::from_utf8(&data[body_start..end])
            .map_err(|_| Error::Extraction("proof block body is not valid UTF-8".into()))?;
        let cleaned: String = body.chars().filter(|c| !c.is_whitespace()).collect();

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&cleaned)
            .map_err(|e| Error::Extraction(format!("invalid base64 in proof block: {}", e)))?;
        let text = String::from_utf8(decoded)
            .map_err(|_| Error::Extraction("proof text is not valid UTF-8".into()))?;

        proofs.push(text);
        i = end + PROOF_END.len();
    }

    Ok(proofs)
}

/// Append proof text to a PDF, replacing anything after its final `%%EOF`.
#[tracing::instrument(skip(pdf, text), fields(pdf_len = pdf.len()))]
pub fn embed_proof(pdf: &[u8], text: &str) -> Result<Vec<u8>> {
    let (clean, previous) = split_pdf(pdf).map_err(|e| match e {
        Error::Extraction(msg) => Error::InvalidInput(msg),
        other => other,
    })?;
    if !previous.iter().all(u8::is_ascii_whitespace) {
        tracing::debug!(
            dropped = previous.len(),
            "Replacing existing data after %%EOF"
        );
    }

    let block = encode_proof_trailer(text);
    let mut out = Vec::with_capacity(clean.len() + 1 + block.len());
    out.extend_from_slice(clean);
    out.push(b'\n');
    out.extend_from_slice(&block);
    Ok(out)
}

/// Read the proof text from a PDF's trailer. The last block wins.
#[tracing::instrument(skip(pdf), fields(pdf_len = pdf.len()))]
pub fn extract_proof(pdf: &[u8]) -> Result<String> {
    let (_, trailer) = split_pdf(pdf)?;
    parse_proof_trailers(trailer)?
        .pop()
        .ok_or_else(|| Error::Extraction("PDF carries no certificate proof trailer".into()))
}

fn find_subslice(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start >= haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| start + pos)
}
