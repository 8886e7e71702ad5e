//! Proof extraction port: recover proof text from a submitted document.

use crate::error::{Error, Result};
use crate::trailer::extract_proof;

/// Recovers the raw proof text from a document.
pub trait ProofExtractor: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Return the proof text, or `Error::Extraction` when none is found.
    fn extract(&self, data: &[u8]) -> Result<String>;
}

/// Reads the proof trailer appended to a PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailerExtractor;

impl ProofExtractor for TrailerExtractor {
    fn name(&self) -> &'static str {
        "pdf-trailer"
    }

    fn extract(&self, data: &[u8]) -> Result<String> {
        extract_proof(data)
    }
}

/// Tries each extractor in order and returns the first proof found.
#[derive(Default)]
pub struct ChainExtractor {
    extractors: Vec<Box<dyn ProofExtractor>>,
}

impl ChainExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extractor: impl ProofExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }
}

impl ProofExtractor for ChainExtractor {
    fn name(&self) -> &'static str {
        "chain"
    }

    #[tracing::instrument(skip(self, data), fields(data_len = data.len()))]
    fn extract(&self, data: &[u8]) -> Result<String> {
        let mut failures = Vec::new();
        for extractor in &self.extractors {
            match extractor.extract(data) {
                Ok(text) => {
                    tracing::debug!(extractor = extractor.name(), "Proof text extracted");
                    return Ok(text);
                }
                Err(e) => {
                    tracing::debug!(extractor = extractor.name(), error = %e, "Extractor found no proof");
                    failures.push(format!("{}: {}", extractor.name(), e));
                }
            }
        }
        if failures.is_empty() {
            return Err(Error::Extraction("no extractors configured".into()));
        }
        Err(Error::Extraction(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trailer::embed_proof;

    struct Fixed(&'static str);

    impl ProofExtractor for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _data: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn chain_returns_first_success() {
        let pdf = embed_proof(b"%PDF-1.4\n%%EOF", "from trailer").unwrap();
        let chain = ChainExtractor::new()
            .with(TrailerExtractor)
            .with(Fixed("fallback"));
        assert_eq!(chain.extract(&pdf).unwrap(), "from trailer");
        assert_eq!(chain.extract(b"garbage").unwrap(), "fallback");
    }

    #[test]
    fn chain_reports_every_failure() {
        let chain = ChainExtractor::new().with(TrailerExtractor);
        let err = chain.extract(b"garbage").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains("pdf-trailer"));
    }

    #[test]
    fn empty_chain_fails() {
        assert!(ChainExtractor::new().extract(b"").is_err());
    }
}
