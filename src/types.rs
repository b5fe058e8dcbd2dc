//! Shared types for the vault core
//!
//! Data structures that cross module boundaries are defined here
//! for consistent serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::error::{VaultError, VaultResult};

// =============================================================================
// Network Types
// =============================================================================

/// Supported blockchain networks.
///
/// Adding a network means adding a variant here and a `NetworkWallet`
/// implementation selected in `wallet::for_network`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Bitcoin,
    Ethereum,
    Lamden,
}

impl NetworkId {
    pub const ALL: [NetworkId; 3] = [NetworkId::Bitcoin, NetworkId::Ethereum, NetworkId::Lamden];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Bitcoin => "bitcoin",
            NetworkId::Ethereum => "ethereum",
            NetworkId::Lamden => "lamden",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NetworkId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitcoin" => Ok(NetworkId::Bitcoin),
            "ethereum" => Ok(NetworkId::Ethereum),
            "lamden" => Ok(NetworkId::Lamden),
            _ => Err(VaultError::unsupported_network(s.trim())),
        }
    }
}

/// Sub-identifier within a network family (e.g. `BTC` vs `BTCTEST`,
/// or an Ethereum chain id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkSymbol(String);

impl NetworkSymbol {
    /// Trimmed, non-empty symbol
    pub fn new(symbol: &str) -> VaultResult<Self> {
        let trimmed = crate::utils::require_non_empty(symbol, "Symbol")?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Key Types
// =============================================================================

/// A generated or imported key pair.
///
/// `private_key` is in the network's native encoding: WIF for bitcoin,
/// `0x`-prefixed hex for ethereum, 64-char hex seed for lamden.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyPair {
    pub network: NetworkId,
    pub symbol: NetworkSymbol,
    pub public_address: String,
    pub private_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("network", &self.network)
            .field("symbol", &self.symbol)
            .field("public_address", &self.public_address)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// A network together with the symbols it accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedNetwork {
    pub network: NetworkId,
    /// Known symbols; empty when any non-empty symbol is accepted
    pub symbols: Vec<String>,
    pub accepts_any_symbol: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_id_parsing() {
        assert_eq!(" Bitcoin ".parse::<NetworkId>().unwrap(), NetworkId::Bitcoin);
        assert_eq!("ethereum".parse::<NetworkId>().unwrap(), NetworkId::Ethereum);
        assert_eq!("LAMDEN".parse::<NetworkId>().unwrap(), NetworkId::Lamden);

        let err = "dogecoin".parse::<NetworkId>().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::UnsupportedNetwork);
    }

    #[test]
    fn test_network_id_serde() {
        let json = serde_json::to_string(&NetworkId::Lamden).unwrap();
        assert_eq!(json, "\"lamden\"");
    }

    #[test]
    fn test_symbol_rejects_blank() {
        assert!(NetworkSymbol::new("   ").is_err());
        assert_eq!(NetworkSymbol::new(" BTC ").unwrap().as_str(), "BTC");
    }

    #[test]
    fn test_keypair_debug_redacts_private_key() {
        let pair = KeyPair {
            network: NetworkId::Ethereum,
            symbol: NetworkSymbol::new("1").unwrap(),
            public_address: "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F".to_string(),
            private_key: "0x4646464646464646464646464646464646464646464646464646464646464646".to_string(),
        };
        let rendered = format!("{:?}", pair);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("4646464646"));
    }
}
