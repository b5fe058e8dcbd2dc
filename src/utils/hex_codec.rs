//! Hex and string input helpers shared by every signer.

use crate::error::{ErrorCode, VaultError, VaultResult};

/// Trim `value` and reject it if nothing is left.
pub fn require_non_empty<'a>(value: &'a str, field: &str) -> VaultResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VaultError::invalid_input(format!("{} must be a non-empty string", field)));
    }
    Ok(trimmed)
}

/// Strip a leading `0x` / `0X`.
pub fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

/// Decode a hex string with an optional `0x` prefix.
///
/// Odd lengths and non-hex characters are rejected rather than truncated.
/// An empty payload decodes to an empty vector; callers decide whether
/// that is acceptable.
pub fn decode_hex(hex_str: &str) -> VaultResult<Vec<u8>> {
    Ok(hex::decode(strip_hex_prefix(hex_str.trim()))?)
}

/// Decode a hex payload that must not be empty.
pub fn decode_hex_non_empty(hex_str: &str, field: &str) -> VaultResult<Vec<u8>> {
    let bytes = decode_hex(hex_str).map_err(|e| {
        VaultError::new(ErrorCode::HexError, format!("Invalid {}", field)).with_details(e.message)
    })?;
    if bytes.is_empty() {
        return Err(VaultError::invalid_input(format!("Invalid {}: String Empty", field)));
    }
    Ok(bytes)
}

/// Lowercase hex without prefix.
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}
