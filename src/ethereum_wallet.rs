//! Ethereum wallet: raw hex secp256k1 keys and EIP-55 addresses.

use ethers_signers::{LocalWallet, Signer};
use rand::rngs::OsRng;

use crate::error::VaultResult;
use crate::tx::{resolve_chain_id, sign_ethereum_transaction, wallet_from_key, NAMED_CHAINS};
use crate::types::*;
use crate::utils::{encode_hex, to_checksum_address};
use crate::wallet::{validate_checksum_address, NetworkWallet};

const CHAIN_NAMES: &[&str] = &["goerli", "kovan", "mainnet", "rinkeby", "ropsten", "sepolia"];

fn checksum_address(wallet: &LocalWallet) -> String {
    to_checksum_address(wallet.address().as_bytes())
}

/// Ethereum network wallet
#[derive(Debug, Clone, Copy, Default)]
pub struct EthereumWallet;

impl NetworkWallet for EthereumWallet {
    fn network(&self) -> NetworkId {
        NetworkId::Ethereum
    }

    fn known_symbols(&self) -> &'static [&'static str] {
        CHAIN_NAMES
    }

    /// Addresses are chain-independent, so any symbol derives the same one.
    fn accepts_any_symbol(&self) -> bool {
        true
    }

    /// Known chains collapse to one spelling: the chain name when there is
    /// one, otherwise the decimal id. Other symbols are kept as given.
    fn resolve_symbol(&self, symbol: &str) -> VaultResult<NetworkSymbol> {
        let Ok(chain_id) = resolve_chain_id(symbol) else {
            return NetworkSymbol::new(symbol);
        };
        match NAMED_CHAINS.iter().find(|(_, id)| *id == chain_id) {
            Some((name, _)) => NetworkSymbol::new(name),
            None => NetworkSymbol::new(&chain_id.to_string()),
        }
    }

    fn derive_address(&self, _symbol: &NetworkSymbol, private_key: &str) -> VaultResult<String> {
        let wallet = wallet_from_key(private_key)?;
        Ok(checksum_address(&wallet))
    }

    fn generate(&self, symbol: &NetworkSymbol) -> VaultResult<KeyPair> {
        let wallet = LocalWallet::new(&mut OsRng);
        let private_key = format!("0x{}", encode_hex(wallet.signer().to_bytes()));

        Ok(KeyPair {
            network: NetworkId::Ethereum,
            symbol: symbol.clone(),
            public_address: checksum_address(&wallet),
            private_key,
        })
    }

    fn validate_address(&self, address: &str) -> VaultResult<String> {
        validate_checksum_address(address)
    }

    fn sign_transaction(
        &self,
        raw_transaction: &str,
        private_key: &str,
        symbol: &NetworkSymbol,
    ) -> VaultResult<String> {
        sign_ethereum_transaction(raw_transaction, private_key, symbol.as_str())
    }
}
