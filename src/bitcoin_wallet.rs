//! Bitcoin wallet: WIF private keys and legacy P2PKH addresses.

use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{Address, Network, NetworkKind, PrivateKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{ErrorCode, VaultError, VaultResult};
use crate::tx::sign_bitcoin_transaction;
use crate::types::*;
use crate::wallet::{validate_base58check_address, NetworkWallet};

pub const MAINNET_SYMBOL: &str = "BTC";
pub const TESTNET_SYMBOL: &str = "BTCTEST";

/// Concrete network parameters for a bitcoin symbol
pub fn network_for_symbol(symbol: &str) -> VaultResult<Network> {
    match symbol.trim().to_ascii_uppercase().as_str() {
        "BTC" | "MAINNET" => Ok(Network::Bitcoin),
        "BTCTEST" | "TESTNET" => Ok(Network::Testnet),
        _ => Err(VaultError::unsupported_symbol(NetworkId::Bitcoin, symbol.trim())),
    }
}

fn canonical_symbol(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => MAINNET_SYMBOL,
        _ => TESTNET_SYMBOL,
    }
}

/// Decode a WIF key, requiring its prefix to match `network`
pub fn decode_wif(private_key: &str, network: Network) -> VaultResult<PrivateKey> {
    let key = PrivateKey::from_wif(private_key.trim()).map_err(|e| {
        VaultError::invalid_private_key("Not a valid bitcoin private key").with_details(e.to_string())
    })?;

    if key.network != NetworkKind::from(network) {
        return Err(VaultError::invalid_private_key("Not a valid bitcoin private key")
            .with_details(format!("WIF prefix does not match {}", canonical_symbol(network))));
    }

    Ok(key)
}

/// Legacy pay-to-public-key-hash address; follows the key's compression flag
pub fn p2pkh_address(key: &PrivateKey, network: Network) -> String {
    let secp = Secp256k1::signing_only();
    let public_key = key.public_key(&secp);
    Address::p2pkh(public_key.pubkey_hash(), network).to_string()
}

fn random_secret_key() -> VaultResult<SecretKey> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    // A random 32-byte string is out of range with negligible probability
    for _ in 0..8 {
        OsRng.fill_bytes(&mut bytes[..]);
        if let Ok(secret) = SecretKey::from_slice(&bytes[..]) {
            return Ok(secret);
        }
    }
    Err(VaultError::key_generation_failed("Error creating bitcoin network wallet")
        .with_details("random source produced no valid secp256k1 scalar"))
}

/// Bitcoin network wallet
#[derive(Debug, Clone, Copy, Default)]
pub struct BitcoinWallet;

impl NetworkWallet for BitcoinWallet {
    fn network(&self) -> NetworkId {
        NetworkId::Bitcoin
    }

    fn known_symbols(&self) -> &'static [&'static str] {
        &[MAINNET_SYMBOL, TESTNET_SYMBOL]
    }

    fn accepts_any_symbol(&self) -> bool {
        false
    }

    fn resolve_symbol(&self, symbol: &str) -> VaultResult<NetworkSymbol> {
        let network = network_for_symbol(symbol)?;
        NetworkSymbol::new(canonical_symbol(network))
    }

    fn derive_address(&self, symbol: &NetworkSymbol, private_key: &str) -> VaultResult<String> {
        let network = network_for_symbol(symbol.as_str())?;
        let key = decode_wif(private_key, network)?;
        Ok(p2pkh_address(&key, network))
    }

    /// New keys are uncompressed, so the address hashes the 65-byte public key.
    fn generate(&self, symbol: &NetworkSymbol) -> VaultResult<KeyPair> {
        let network = network_for_symbol(symbol.as_str()).map_err(|e| {
            e.recode(
                ErrorCode::KeyGenerationFailed,
                format!("Error creating bitcoin network wallet for {}", symbol),
            )
        })?;

        let private_key = PrivateKey::new_uncompressed(random_secret_key()?, network);
        let public_address = p2pkh_address(&private_key, network);

        Ok(KeyPair {
            network: NetworkId::Bitcoin,
            symbol: NetworkSymbol::new(canonical_symbol(network))?,
            public_address,
            private_key: private_key.to_wif(),
        })
    }

    fn validate_address(&self, address: &str) -> VaultResult<String> {
        validate_base58check_address(NetworkId::Bitcoin.as_str(), address)
    }

    fn sign_transaction(
        &self,
        raw_transaction: &str,
        private_key: &str,
        symbol: &NetworkSymbol,
    ) -> VaultResult<String> {
        sign_bitcoin_transaction(raw_transaction, private_key, symbol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Private key 1
    const UNCOMPRESSED_WIF: &str = "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf";
    const COMPRESSED_WIF: &str = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";

    fn symbol(s: &str) -> NetworkSymbol {
        NetworkSymbol::new(s).unwrap()
    }

    #[test]
    fn test_known_key_addresses() {
        let wallet = BitcoinWallet;
        assert_eq!(
            wallet.derive_address(&symbol("BTC"), UNCOMPRESSED_WIF).unwrap(),
            "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm"
        );
        assert_eq!(
            wallet.derive_address(&symbol("BTC"), COMPRESSED_WIF).unwrap(),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
    }

    #[test]
    fn test_wif_network_mismatch() {
        let err = BitcoinWallet.derive_address(&symbol("BTCTEST"), UNCOMPRESSED_WIF).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrivateKey);
        assert!(err.details.unwrap().contains("BTCTEST"));
    }

    #[test]
    fn test_garbage_key_rejected() {
        let err = BitcoinWallet.derive_address(&symbol("BTC"), "not-a-wif").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrivateKey);
    }

    #[test]
    fn test_generate_testnet_key() {
        let pair = BitcoinWallet.generate(&symbol("BTCTEST")).unwrap();
        assert_eq!(pair.symbol.as_str(), "BTCTEST");
        assert!(pair.public_address.starts_with('m') || pair.public_address.starts_with('n'));

        // Uncompressed testnet WIFs start with '9'
        assert!(pair.private_key.starts_with('9'));
        let key = decode_wif(&pair.private_key, Network::Testnet).unwrap();
        assert!(!key.compressed);
    }

    #[test]
    fn test_symbol_aliases() {
        assert_eq!(network_for_symbol("btc").unwrap(), Network::Bitcoin);
        assert_eq!(network_for_symbol("testnet").unwrap(), Network::Testnet);
        assert_eq!(
            BitcoinWallet.resolve_symbol("mainnet").unwrap().as_str(),
            MAINNET_SYMBOL
        );
        assert_eq!(
            network_for_symbol("LTC").unwrap_err().code,
            ErrorCode::UnsupportedSymbol
        );
    }

    #[test]
    fn test_validate_address() {
        let addr = BitcoinWallet.validate_address("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap();
        assert_eq!(addr, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(
            BitcoinWallet.validate_address("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMh").unwrap_err().code,
            ErrorCode::InvalidAddress
        );
    }
}
