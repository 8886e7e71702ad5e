//! Error taxonomy for issuance and verification.

use thiserror::Error;

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the certificate protocol.
#[derive(Debug, Error)]
pub enum Error {
    /// A required certificate field is missing or cannot be read as a string.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No proof payload could be found in the supplied document.
    #[error("No certificate proof found: {0}")]
    Extraction(String),

    /// The ledger could not be reached or the contract call failed.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// The fingerprint is already recorded on the ledger.
    #[error("Certificate already issued")]
    AlreadyIssued,
}

impl Error {
    /// Whether the operation was declined (as opposed to failing).
    ///
    /// Declined operations are reported to the caller with their message.
    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::AlreadyIssued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_issued_message_is_stable() {
        assert_eq!(Error::AlreadyIssued.to_string(), "Certificate already issued");
    }

    #[test]
    fn declined_classification() {
        assert!(Error::AlreadyIssued.is_declined());
        assert!(Error::InvalidInput("name".into()).is_declined());
        assert!(!Error::Ledger("timeout".into()).is_declined());
        assert!(!Error::Extraction("no QR".into()).is_declined());
    }
}
