//! Address derivation and bech32 conversion helpers.

use alloy_primitives::Address;
use bech32::{primitives::decode::CheckedHrpstring, Bech32, Hrp};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length in bytes of an account address.
pub const ADDRESS_LEN: usize = 20;

/// Errors produced by the bech32 helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Bech32Error {
    /// The human readable part is empty or contains invalid characters.
    #[error("invalid bech32 prefix {hrp:?}: {reason}")]
    InvalidPrefix {
        /// Offending prefix.
        hrp: String,
        /// Parser message.
        reason: String,
    },
    /// Encoding failed, usually because the payload is too long.
    #[error("bech32 encoding failed: {0}")]
    Encode(String),
    /// The string is not valid bech32.
    #[error("decoding bech32 failed: {0}")]
    Decode(String),
    /// The decoded payload does not have the expected length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Decoded length.
        got: usize,
    },
}

/// Derives the account address of a module from its name: the first 20 bytes of
/// `sha256(name)`.
pub fn module_address(name: &str) -> Address {
    let digest = Sha256::digest(name.as_bytes());
    Address::from_slice(&digest[..ADDRESS_LEN])
}

/// Encodes `data` as a bech32 string with the given human readable part.
pub fn encode_bech32(hrp: &str, data: &[u8]) -> Result<String, Bech32Error> {
    let parsed = Hrp::parse(hrp).map_err(|err| Bech32Error::InvalidPrefix {
        hrp: hrp.to_string(),
        reason: err.to_string(),
    })?;
    bech32::encode::<Bech32>(parsed, data).map_err(|err| Bech32Error::Encode(err.to_string()))
}

/// Decodes a bech32 string into its human readable part and payload bytes.
///
/// Only the original bech32 checksum is accepted; bech32m strings are rejected.
pub fn decode_bech32(encoded: &str) -> Result<(String, Vec<u8>), Bech32Error> {
    if encoded.is_empty() {
        return Err(Bech32Error::Decode("empty string".to_string()));
    }
    let checked = CheckedHrpstring::new::<Bech32>(encoded)
        .map_err(|err| Bech32Error::Decode(err.to_string()))?;
    let hrp = checked.hrp().to_string();
    let data = checked.byte_iter().collect();
    Ok((hrp, data))
}

/// Encodes a 20-byte address with the given prefix.
pub fn address_to_bech32(hrp: &str, address: Address) -> Result<String, Bech32Error> {
    encode_bech32(hrp, address.as_slice())
}

/// Decodes a bech32 account address regardless of its prefix.
pub fn address_from_bech32(encoded: &str) -> Result<Address, Bech32Error> {
    let (_, data) = decode_bech32(encoded)?;
    if data.len() != ADDRESS_LEN {
        return Err(Bech32Error::InvalidLength { expected: ADDRESS_LEN, got: data.len() });
    }
    Ok(Address::from_slice(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn module_address_is_sha256_prefix() {
        let digest = Sha256::digest(b"erc20");
        assert_eq!(module_address("erc20").as_slice(), &digest[..20]);
        assert_ne!(module_address("erc20"), module_address("fee_collector"));
    }

    #[test]
    fn address_roundtrip_keeps_prefix_and_bytes() {
        let addr = address!("0x1000000000000000000000000000000000000001");
        let encoded = address_to_bech32("cosmos", addr).expect("encodes");
        assert!(encoded.starts_with("cosmos1"));

        let (hrp, data) = decode_bech32(&encoded).expect("decodes");
        assert_eq!(hrp, "cosmos");
        assert_eq!(data, addr.as_slice());
        assert_eq!(address_from_bech32(&encoded).expect("address"), addr);
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = encode_bech32("", &[1, 2, 3]).expect_err("empty hrp");
        assert!(matches!(err, Bech32Error::InvalidPrefix { .. }));
    }

    #[test]
    fn corrupted_checksum_fails_to_decode() {
        let addr = address!("0x1000000000000000000000000000000000000001");
        let mut encoded = address_to_bech32("evmos", addr).expect("encodes");
        let last = encoded.pop().expect("non-empty");
        encoded.push(if last == 'q' { 'p' } else { 'q' });
        assert!(decode_bech32(&encoded).is_err());
    }

    #[test]
    fn address_length_is_enforced() {
        let encoded = encode_bech32("cosmos", &[7u8; 32]).expect("encodes");
        let err = address_from_bech32(&encoded).expect_err("32 bytes is not an address");
        assert_eq!(err, Bech32Error::InvalidLength { expected: 20, got: 32 });
    }
}
