//! Certificate registry contract binding.

use alloy::primitives::{Address, U256};
use anyhow::{Result, anyhow};

alloy::sol! {
    #[sol(rpc)]
    interface CertificateRegistry {
        function issueCertificate(uint256 certificateNumber, string certificateHash) external;
        function verifyCertificate(string certificateHash)
            external
            view
            returns (bool issued, uint256 certificateNumber);
    }
}

/// Parse a `0x`-prefixed contract or account address.
pub fn parse_address(address: &str) -> Result<Address> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| anyhow!("Invalid address '{}': {}", address, e))
}

/// Narrow a registry certificate number to the `u64` the protocol uses.
pub fn certificate_number(value: U256) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("Certificate number {} does not fit in 64 bits", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{SolCall, SolValue};

    #[test]
    fn selectors_match_registry_signatures() {
        assert_eq!(
            CertificateRegistry::issueCertificateCall::SIGNATURE,
            "issueCertificate(uint256,string)"
        );
        assert_eq!(
            CertificateRegistry::verifyCertificateCall::SIGNATURE,
            "verifyCertificate(string)"
        );
    }

    #[test]
    fn issue_call_round_trips() {
        let call = CertificateRegistry::issueCertificateCall {
            certificateNumber: U256::from(123u64),
            certificateHash: "f".repeat(64),
        };
        let data = call.abi_encode();
        assert_eq!(data[..4], CertificateRegistry::issueCertificateCall::SELECTOR);

        let decoded = CertificateRegistry::issueCertificateCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.certificateNumber, U256::from(123u64));
        assert_eq!(decoded.certificateHash, "f".repeat(64));
    }

    #[test]
    fn verify_result_is_two_static_words() {
        let encoded = (true, U256::from(7u64)).abi_encode();
        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded[31], 1);
        assert_eq!(encoded[63], 7);
    }

    #[test]
    fn parses_addresses() {
        let addr = parse_address(" 0x60df8e064e885c1f0dfd53193e4f0c637424c001 ").unwrap();
        assert_eq!(
            addr,
            parse_address("0x60DF8E064E885C1F0DFD53193E4F0C637424C001").unwrap()
        );
        assert!(parse_address("not-an-address").is_err());
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn oversized_numbers_are_rejected() {
        assert_eq!(certificate_number(U256::from(123u64)).unwrap(), 123);
        assert!(certificate_number(U256::from(u64::MAX) + U256::from(1u64)).is_err());
    }
}
