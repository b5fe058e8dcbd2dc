//! Address Validation
//!
//! Format and checksum checks shared by the network wallets:
//! - Base58Check legacy addresses (bitcoin)
//! - EIP-55 checksum addresses (ethereum)
//! - Hex-encoded ed25519 verifying keys (lamden)

use ed25519_dalek::VerifyingKey;

use crate::error::{VaultError, VaultResult};
use crate::utils::{base58check_decode, strip_hex_prefix, to_checksum_address};

/// Version byte plus a 20-byte hash
const BASE58_ADDRESS_PAYLOAD_LEN: usize = 21;

/// Validate a Base58Check address (version byte + 20-byte hash).
///
/// Returns the trimmed address unchanged.
pub fn validate_base58check_address(network: &str, address: &str) -> VaultResult<String> {
    let trimmed = address.trim();
    let payload = base58check_decode(trimmed).map_err(|cause| {
        VaultError::invalid_address(format!("Not a valid {} public key", network)).with_details(cause)
    })?;

    if payload.len() < BASE58_ADDRESS_PAYLOAD_LEN {
        return Err(VaultError::invalid_address(format!("Not a valid {} public key", network))
            .with_details(format!("{} is too short", trimmed)));
    }
    if payload.len() > BASE58_ADDRESS_PAYLOAD_LEN {
        return Err(VaultError::invalid_address(format!("Not a valid {} public key", network))
            .with_details(format!("{} is too long", trimmed)));
    }

    Ok(trimmed.to_string())
}

/// Check an Ethereum address and return its EIP-55 checksum form.
///
/// Accepts 40 hex characters with an optional `0x` prefix. All-lowercase
/// and all-uppercase inputs carry no checksum and are accepted; mixed-case
/// inputs must match the EIP-55 casing exactly.
pub fn validate_checksum_address(address: &str) -> VaultResult<String> {
    let trimmed = address.trim();
    let hex_part = strip_hex_prefix(trimmed);

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VaultError::invalid_address("Not a valid ethereum public key")
            .with_details("expected 40 hex characters with optional 0x prefix"));
    }

    let bytes = hex::decode(hex_part.to_ascii_lowercase())?;
    let checksummed = to_checksum_address(&bytes);

    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower && hex_part != &checksummed[2..] {
        return Err(VaultError::invalid_address("Not a valid ethereum public key")
            .with_details("invalid EIP-55 checksum"));
    }

    Ok(checksummed)
}

/// Check a lamden address: 64 hex characters encoding an ed25519 point.
///
/// Returns the lowercase form.
pub fn validate_ed25519_address(address: &str) -> VaultResult<String> {
    let trimmed = address.trim();
    let invalid = || VaultError::invalid_address("Not a valid lamden public key");

    if trimmed.len() != 64 {
        return Err(invalid().with_details("expected 64 hex characters"));
    }
    let bytes: [u8; 32] = hex::decode(trimmed)
        .map_err(|e| invalid().with_details(e.to_string()))?
        .try_into()
        .map_err(|_| invalid().with_details("expected 32 bytes"))?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| invalid().with_details(e.to_string()))?;

    Ok(trimmed.to_ascii_lowercase())
}
