//! Unified error types for the vault core
//!
//! All errors flow through this module so callers see one typed error
//! with a stable code, a human-readable message and the underlying cause.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all vault operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl VaultError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn unsupported_network(network: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsupportedNetwork,
            format!("{} is not a supported network", network),
        )
    }

    pub fn unsupported_symbol(network: impl fmt::Display, symbol: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsupportedSymbol,
            format!("{} is not a supported symbol on the {} network", symbol, network),
        )
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrivateKey, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn key_generation_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::KeyGenerationFailed, msg)
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailed, msg)
    }

    pub fn storage_locked() -> Self {
        Self::new(ErrorCode::StorageLocked, "Storage is locked")
    }

    pub fn incorrect_password() -> Self {
        Self::new(ErrorCode::IncorrectPassword, "Incorrect password")
    }

    pub fn key_not_found() -> Self {
        Self::new(ErrorCode::KeyNotFound, "Key not found")
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Re-tag an error under a new code, keeping the original message as the cause.
    ///
    /// Used where a lower layer's failure has to surface as a single
    /// operation-level kind (e.g. everything on the bitcoin signing path
    /// becomes `SigningFailed`).
    pub fn recode(self, code: ErrorCode, message: impl Into<String>) -> Self {
        let cause = match self.details {
            Some(details) => format!("{} ({})", self.message, details),
            None => self.message,
        };
        Self::new(code, message).with_details(cause)
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for VaultError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    UnsupportedNetwork,
    UnsupportedSymbol,
    InvalidPrivateKey,
    InvalidAddress,
    InvalidTransaction,

    // Key and signing errors
    KeyGenerationFailed,
    SigningFailed,
    CryptoError,

    // Key store errors
    StorageLocked,
    IncorrectPassword,
    KeyNotFound,
    StorageError,

    // Parse errors
    ParseError,
    JsonError,
    HexError,

    // Internal
    Internal,
}

/// Result type alias for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

// Conversions from common error types

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for VaultError {
    fn from(e: hex::FromHexError) -> Self {
        VaultError::new(ErrorCode::HexError, format!("Invalid hex: {}", e))
    }
}

impl From<std::io::Error> for VaultError {
    fn from(e: std::io::Error) -> Self {
        VaultError::new(ErrorCode::StorageError, e.to_string())
    }
}

impl From<bitcoin::secp256k1::Error> for VaultError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        VaultError::new(ErrorCode::CryptoError, format!("Secp256k1 error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = VaultError::signing_failed("Signing failed")
            .with_details("input 0 references a missing redeem script");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("signing_failed"));
        assert!(json.contains("missing redeem script"));
    }

    #[test]
    fn test_recode_preserves_cause() {
        let err = VaultError::invalid_private_key("Invalid Private Key")
            .with_details("base58 checksum mismatch")
            .recode(ErrorCode::SigningFailed, "Signing failed");

        assert_eq!(err.code, ErrorCode::SigningFailed);
        let details = err.details.unwrap();
        assert!(details.contains("Invalid Private Key"));
        assert!(details.contains("checksum mismatch"));
    }

    #[test]
    fn test_display_includes_details() {
        let err = VaultError::unsupported_symbol("bitcoin", "DOGE");
        assert_eq!(err.code, ErrorCode::UnsupportedSymbol);
        assert_eq!(
            err.to_string(),
            "[UnsupportedSymbol] DOGE is not a supported symbol on the bitcoin network"
        );
    }
}
