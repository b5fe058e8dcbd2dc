//! Multichain Vault Core
//!
//! Key management and transaction signing for bitcoin, ethereum and lamden.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: Key generation, address derivation and address validation
//! - **tx**: Signing of caller-supplied raw transactions, including legacy
//!   bitcoin redeem-script inputs
//! - **keystore**: Password-encrypted storage of private keys
//! - **utils**: Hex codec, checksum helpers, encryption, logging, settings
//!
//! # Security
//!
//! Private keys never leave the key store except through
//! [`KeyStore::get_private_key`]. Decrypted keyrings, derived encryption
//! keys and generated key pairs are zeroed when dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use multichain_vault::{generate_new, sign_transaction, KeyStore, MemoryBlobStore};
//!
//! let store = KeyStore::new(MemoryBlobStore::new());
//! store.unlock("correct horse battery")?;
//!
//! let pair = generate_new("bitcoin", "BTCTEST")?;
//! let address = store.add_key("bitcoin", "BTCTEST", &pair.private_key)?;
//! let key = store.get_private_key("bitcoin", &address)?;
//! let signed = sign_transaction(&raw_tx_hex, &key, "bitcoin", "BTCTEST")?;
//! ```

pub mod error;
pub mod types;
pub mod utils;
pub mod wallet;
pub mod tx;
pub mod keystore;

pub mod bitcoin_wallet;
pub mod ethereum_wallet;
pub mod lamden_wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, VaultError, VaultResult};
pub use types::*;

pub use keystore::{BlobStore, BlobUpdate, FileBlobStore, KeyListing, KeyStore, MemoryBlobStore};
pub use tx::sign_transaction;
pub use utils::security_config::{KdfParams, SecurityLevel, SecuritySettings};
pub use wallet::{derive_address, generate_new, supported_networks, validate_address, NetworkWallet};
