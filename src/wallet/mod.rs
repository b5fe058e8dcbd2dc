//! Wallet Module
//!
//! The key-derivation engine and address validator. Every supported
//! network implements [`NetworkWallet`]; the string entry points below
//! validate their arguments and dispatch on [`NetworkId`].

mod address_validation;

pub use address_validation::*;

use crate::bitcoin_wallet::BitcoinWallet;
use crate::error::VaultResult;
use crate::ethereum_wallet::EthereumWallet;
use crate::lamden_wallet::LamdenWallet;
use crate::types::*;
use crate::utils::require_non_empty;

/// Capabilities every supported network provides
pub trait NetworkWallet: Send + Sync {
    /// The network this wallet handles
    fn network(&self) -> NetworkId;

    /// Symbols this network knows by name
    fn known_symbols(&self) -> &'static [&'static str];

    /// Whether symbols outside `known_symbols` are accepted
    fn accepts_any_symbol(&self) -> bool;

    /// Canonical form of `symbol`, or `UnsupportedSymbol`
    fn resolve_symbol(&self, symbol: &str) -> VaultResult<NetworkSymbol>;

    /// Public address for an existing private key
    fn derive_address(&self, symbol: &NetworkSymbol, private_key: &str) -> VaultResult<String>;

    /// Fresh random key pair
    fn generate(&self, symbol: &NetworkSymbol) -> VaultResult<KeyPair>;

    /// Well-formedness/checksum check, returning the canonical address
    fn validate_address(&self, address: &str) -> VaultResult<String>;

    /// Sign a hex-encoded raw transaction, returning the signed hex
    fn sign_transaction(
        &self,
        raw_transaction: &str,
        private_key: &str,
        symbol: &NetworkSymbol,
    ) -> VaultResult<String>;
}

static BITCOIN: BitcoinWallet = BitcoinWallet;
static ETHEREUM: EthereumWallet = EthereumWallet;
static LAMDEN: LamdenWallet = LamdenWallet;

/// Select the implementation for a network
pub fn for_network(network: NetworkId) -> &'static dyn NetworkWallet {
    match network {
        NetworkId::Bitcoin => &BITCOIN,
        NetworkId::Ethereum => &ETHEREUM,
        NetworkId::Lamden => &LAMDEN,
    }
}

/// Parse and validate a network name
pub fn parse_network(network: &str) -> VaultResult<NetworkId> {
    require_non_empty(network, "Network")?.parse()
}

/// Gets the public address of a private key on a network/symbol
pub fn derive_address(network: &str, symbol: &str, private_key: &str) -> VaultResult<String> {
    let network = parse_network(network)?;
    require_non_empty(symbol, "Symbol")?;
    let private_key = require_non_empty(private_key, "Private Key")?;

    let wallet = for_network(network);
    let symbol = wallet.resolve_symbol(symbol)?;
    wallet.derive_address(&symbol, private_key)
}

/// Create a new key pair for a network/symbol combination
pub fn generate_new(network: &str, symbol: &str) -> VaultResult<KeyPair> {
    let network = parse_network(network)?;
    require_non_empty(symbol, "Symbol")?;

    let wallet = for_network(network);
    let symbol = wallet.resolve_symbol(symbol).map_err(|e| {
        e.recode(
            crate::error::ErrorCode::KeyGenerationFailed,
            format!("Error creating {} network wallet", network),
        )
    })?;
    wallet.generate(&symbol)
}

/// Validate an address for a network, returning its canonical form
pub fn validate_address(network: &str, address: &str) -> VaultResult<String> {
    let network = parse_network(network)?;
    let address = require_non_empty(address, "Wallet Address")?;
    for_network(network).validate_address(address)
}

/// Every supported network with the symbols it accepts, sorted by network
pub fn supported_networks() -> Vec<SupportedNetwork> {
    NetworkId::ALL
        .iter()
        .map(|&network| {
            let wallet = for_network(network);
            let mut symbols: Vec<String> = wallet.known_symbols().iter().map(|s| s.to_string()).collect();
            symbols.sort();
            SupportedNetwork {
                network,
                accepts_any_symbol: wallet.accepts_any_symbol(),
                symbols,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_generate_then_derive_is_self_consistent() {
        for (network, symbol) in [("bitcoin", "BTC"), ("bitcoin", "BTCTEST"), ("ethereum", "1"), ("lamden", "TAU")] {
            let pair = generate_new(network, symbol).unwrap();
            let derived = derive_address(network, symbol, &pair.private_key).unwrap();
            assert_eq!(derived, pair.public_address, "{} {}", network, symbol);
            assert_eq!(pair.network.as_str(), network);
        }
    }

    #[test]
    fn test_unsupported_network() {
        assert_eq!(
            derive_address("dogecoin", "DOGE", "key").unwrap_err().code,
            ErrorCode::UnsupportedNetwork
        );
        assert_eq!(generate_new("solana", "SOL").unwrap_err().code, ErrorCode::UnsupportedNetwork);
        assert_eq!(
            validate_address("monero", "4AdUndXHHZ6cfufTMvppY6JwXNouMBzSkbLYfpAV5Usx").unwrap_err().code,
            ErrorCode::UnsupportedNetwork
        );
    }

    #[test]
    fn test_blank_arguments_rejected() {
        assert_eq!(derive_address(" ", "BTC", "key").unwrap_err().code, ErrorCode::InvalidInput);
        assert_eq!(derive_address("bitcoin", "", "key").unwrap_err().code, ErrorCode::InvalidInput);
        assert_eq!(derive_address("bitcoin", "BTC", "  ").unwrap_err().code, ErrorCode::InvalidInput);
        assert_eq!(validate_address("ethereum", "").unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_generate_with_unknown_bitcoin_symbol() {
        let err = generate_new("bitcoin", "DOGE").unwrap_err();
        assert_eq!(err.code, ErrorCode::KeyGenerationFailed);
        assert!(err.details.unwrap().contains("DOGE"));
    }

    #[test]
    fn test_derive_with_unknown_bitcoin_symbol() {
        let err = derive_address("bitcoin", "DOGE", "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedSymbol);
    }

    #[test]
    fn test_supported_networks_sorted() {
        let networks = supported_networks();
        let ids: Vec<_> = networks.iter().map(|n| n.network).collect();
        assert_eq!(ids, vec![NetworkId::Bitcoin, NetworkId::Ethereum, NetworkId::Lamden]);
        assert_eq!(networks[0].symbols, vec!["BTC".to_string(), "BTCTEST".to_string()]);
        assert!(!networks[0].accepts_any_symbol);
        assert!(networks[1].accepts_any_symbol);
    }
}
