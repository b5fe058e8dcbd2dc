//! In-memory keyring: network → symbol → address → private key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::{Zeroize, Zeroizing};

use crate::error::VaultResult;
use crate::types::{NetworkId, NetworkSymbol};

type AddressMap = BTreeMap<String, String>;

/// Addresses grouped by network and symbol, without the keys
pub type KeyListing = BTreeMap<NetworkId, BTreeMap<String, Vec<String>>>;

/// The decrypted key collection. Private keys are wiped on drop.
#[derive(Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyring {
    networks: BTreeMap<NetworkId, BTreeMap<NetworkSymbol, AddressMap>>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(plaintext: &[u8]) -> VaultResult<Self> {
        Ok(serde_json::from_slice(plaintext)?)
    }

    pub fn to_json(&self) -> VaultResult<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(serde_json::to_vec(self)?))
    }

    /// Insert or replace the key stored for an address
    pub fn insert(&mut self, network: NetworkId, symbol: NetworkSymbol, address: String, private_key: String) {
        let slot = self
            .networks
            .entry(network)
            .or_default()
            .entry(symbol)
            .or_default()
            .entry(address)
            .or_default();
        slot.zeroize();
        *slot = private_key;
    }

    pub fn get(&self, network: NetworkId, address: &str) -> Option<&str> {
        self.networks
            .get(&network)?
            .values()
            .find_map(|addresses| addresses.get(address))
            .map(String::as_str)
    }

    /// Remove an address from every symbol group of `network`, dropping
    /// groups that end up empty. Returns whether anything was removed.
    pub fn remove(&mut self, network: NetworkId, address: &str) -> bool {
        let Some(symbols) = self.networks.get_mut(&network) else {
            return false;
        };

        let mut removed = false;
        for addresses in symbols.values_mut() {
            if let Some(mut key) = addresses.remove(address) {
                key.zeroize();
                removed = true;
            }
        }
        symbols.retain(|_, addresses| !addresses.is_empty());
        if symbols.is_empty() {
            self.networks.remove(&network);
        }
        removed
    }

    /// Sorted addresses per network and symbol
    pub fn listing(&self) -> KeyListing {
        self.networks
            .iter()
            .map(|(network, symbols)| {
                let symbols: BTreeMap<String, Vec<String>> = symbols
                    .iter()
                    .map(|(symbol, addresses)| (symbol.to_string(), addresses.keys().cloned().collect()))
                    .collect();
                (*network, symbols)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.networks
            .values()
            .flat_map(|symbols| symbols.values())
            .map(|addresses| addresses.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Drop for Keyring {
    fn drop(&mut self) {
        for addresses in self.networks.values_mut().flat_map(|symbols| symbols.values_mut()) {
            for key in addresses.values_mut() {
                key.zeroize();
            }
        }
    }
}
