//! Crypto Utilities
//!
//! Hash and address-encoding helpers shared by the network wallets
//! and the address validator.

use bitcoin::hashes::{sha256d, Hash};
use tiny_keccak::{Hasher, Keccak};

/// Keccak256 hash (used for Ethereum addresses)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Convert raw address bytes to checksummed Ethereum address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() {
            result.push(ch);
        } else if nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Decode a Base58Check string, verifying the 4-byte double-SHA256 checksum.
///
/// Returns the payload without the checksum.
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>, String> {
    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| format!("Invalid Base58 encoding: {}", e))?;

    if decoded.len() < 5 {
        return Err("Invalid Base58Check payload: too short".to_string());
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    let expected = sha256d::Hash::hash(payload);
    if &expected[..4] != checksum {
        return Err("Invalid Base58Check checksum".to_string());
    }

    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        // keccak256("") from the Ethereum yellow paper
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_checksum_address_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let bytes = hex::decode(&expected[2..]).unwrap();
            assert_eq!(to_checksum_address(&bytes), expected);
        }
    }

    #[test]
    fn test_base58check_decode() {
        // Genesis coinbase address
        let payload = base58check_decode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap();
        assert_eq!(payload.len(), 21);
        assert_eq!(payload[0], 0x00);

        assert!(base58check_decode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb").is_err());
        assert!(base58check_decode("0OIl").is_err());
    }
}
