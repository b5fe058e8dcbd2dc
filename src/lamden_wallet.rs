//! Lamden wallet: ed25519 keys, hex-encoded.
//!
//! The private key is the 32-byte seed and the address is the verifying
//! key, both as 64 lowercase hex characters.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};
use crate::types::*;
use crate::utils::{decode_hex, encode_hex};
use crate::wallet::{validate_ed25519_address, NetworkWallet};

fn signing_key(private_key: &str) -> VaultResult<SigningKey> {
    let invalid = || VaultError::invalid_private_key("Not a valid lamden private key");

    let bytes = Zeroizing::new(decode_hex(private_key).map_err(|e| invalid().with_details(e.message))?);
    let seed: &[u8; 32] = bytes[..]
        .try_into()
        .map_err(|_| invalid().with_details(format!("expected 32 bytes, got {}", bytes.len())))?;

    Ok(SigningKey::from_bytes(seed))
}

/// Lamden network wallet
#[derive(Debug, Clone, Copy, Default)]
pub struct LamdenWallet;

impl NetworkWallet for LamdenWallet {
    fn network(&self) -> NetworkId {
        NetworkId::Lamden
    }

    fn known_symbols(&self) -> &'static [&'static str] {
        &[]
    }

    fn accepts_any_symbol(&self) -> bool {
        true
    }

    fn resolve_symbol(&self, symbol: &str) -> VaultResult<NetworkSymbol> {
        NetworkSymbol::new(symbol)
    }

    fn derive_address(&self, _symbol: &NetworkSymbol, private_key: &str) -> VaultResult<String> {
        let key = signing_key(private_key)?;
        Ok(encode_hex(key.verifying_key().as_bytes()))
    }

    fn generate(&self, symbol: &NetworkSymbol) -> VaultResult<KeyPair> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut seed[..]);
        let key = SigningKey::from_bytes(&seed);

        Ok(KeyPair {
            network: NetworkId::Lamden,
            symbol: symbol.clone(),
            public_address: encode_hex(key.verifying_key().as_bytes()),
            private_key: encode_hex(&seed[..]),
        })
    }

    fn validate_address(&self, address: &str) -> VaultResult<String> {
        validate_ed25519_address(address)
    }

    fn sign_transaction(
        &self,
        _raw_transaction: &str,
        _private_key: &str,
        _symbol: &NetworkSymbol,
    ) -> VaultResult<String> {
        Err(VaultError::unsupported_network(NetworkId::Lamden)
            .with_details("transaction signing is not provided for lamden"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn symbol() -> NetworkSymbol {
        NetworkSymbol::new("TAU").unwrap()
    }

    #[test]
    fn test_rfc8032_vector() {
        // RFC 8032 test 1
        let seed = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
        assert_eq!(
            LamdenWallet.derive_address(&symbol(), seed).unwrap(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn test_bad_seed() {
        let err = LamdenWallet.derive_address(&symbol(), "abcd").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrivateKey);
        assert!(LamdenWallet.derive_address(&symbol(), "zz").is_err());
    }

    #[test]
    fn test_generated_address_validates() {
        let pair = LamdenWallet.generate(&symbol()).unwrap();
        assert_eq!(pair.private_key.len(), 64);
        assert_eq!(LamdenWallet.validate_address(&pair.public_address).unwrap(), pair.public_address);
    }
}
