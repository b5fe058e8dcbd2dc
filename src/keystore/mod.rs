//! Encrypted Key Store
//!
//! Password-gated storage of private keys. The whole keyring is encrypted
//! as one blob (see [`crate::utils::encryption`]) and written through a
//! [`BlobStore`]. The store starts Locked; `unlock` decrypts the blob and
//! caches the keyring and password until `lock`.
//!
//! Operations on one store hold its mutex for their whole duration. Saves
//! run inside [`BlobStore::update`], so stores sharing a backend (or a
//! directory, across processes) cannot overwrite each other's changes.

mod keyring;
mod storage;

pub use keyring::{KeyListing, Keyring};
pub use storage::{BlobStore, BlobUpdate, FileBlobStore, MemoryBlobStore};

use secrecy::{ExposeSecret, SecretString};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{ErrorCode, VaultError, VaultResult};
use crate::types::{NetworkId, NetworkSymbol};
use crate::utils::encryption::{self, EncryptedBlob};
use crate::utils::require_non_empty;
use crate::utils::security_config::SecuritySettings;
use crate::wallet::{for_network, parse_network};
use crate::{log_debug, log_info, log_warn};

enum StoreState {
    Locked,
    Unlocked { password: SecretString, keyring: Keyring },
}

/// Password-protected key store over a blob backend
pub struct KeyStore<S: BlobStore> {
    backend: S,
    settings: SecuritySettings,
    state: Mutex<StoreState>,
}

impl<S: BlobStore> KeyStore<S> {
    /// A locked store using the standard security preset
    pub fn new(backend: S) -> Self {
        Self::with_settings(backend, SecuritySettings::default())
    }

    pub fn with_settings(backend: S, settings: SecuritySettings) -> Self {
        for warning in settings.validate() {
            log_warn!("keystore", "Weak security settings", warning = warning);
        }
        Self {
            backend,
            settings,
            state: Mutex::new(StoreState::Locked),
        }
    }

    pub fn settings(&self) -> &SecuritySettings {
        &self.settings
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn state(&self) -> VaultResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| VaultError::internal("Key store lock poisoned"))
    }

    fn open_keyring(json: &str, password: &str) -> VaultResult<Keyring> {
        let blob = EncryptedBlob::from_json(json)?;
        let plaintext = encryption::decrypt(&blob, password)?;
        Keyring::from_json(&plaintext).map_err(|e| e.recode(ErrorCode::ParseError, "Invalid keyring contents"))
    }

    fn seal_keyring(&self, keyring: &Keyring, password: &str) -> VaultResult<String> {
        let plaintext = keyring.to_json()?;
        encryption::encrypt(&plaintext, password, &self.settings.kdf)?.to_json()
    }

    /// Decrypt, change and persist the keyring under the cached password.
    ///
    /// The whole cycle runs under the backend's exclusive access, starting
    /// from the persisted blob. The cached keyring is only replaced once the
    /// new blob is stored.
    fn mutate<T>(&self, change: impl FnOnce(&mut Keyring) -> VaultResult<T>) -> VaultResult<T> {
        let mut state = self.state()?;
        let StoreState::Unlocked { password, keyring } = &mut *state else {
            return Err(VaultError::storage_locked());
        };
        let password = password.expose_secret();

        let mut change = Some(change);
        let mut outcome = None;
        self.backend.update(&self.settings.storage_key, &mut |current| {
            let change = change
                .take()
                .ok_or_else(|| VaultError::internal("Keyring update ran twice"))?;
            let mut updated = match current {
                Some(json) => Self::open_keyring(&json, password)?,
                None => Keyring::new(),
            };
            let result = change(&mut updated)?;
            let blob = self.seal_keyring(&updated, password)?;
            outcome = Some((updated, result));
            Ok(blob)
        })?;

        let (updated, result) = outcome.ok_or_else(|| VaultError::internal("Keyring update did not run"))?;
        *keyring = updated;
        Ok(result)
    }

    fn read<T>(&self, view: impl FnOnce(&Keyring) -> VaultResult<T>) -> VaultResult<T> {
        let state = self.state()?;
        match &*state {
            StoreState::Unlocked { keyring, .. } => view(keyring),
            StoreState::Locked => Err(VaultError::storage_locked()),
        }
    }

    /// Unlock with `password`.
    ///
    /// With no blob persisted yet this succeeds and the password is used for
    /// future saves. A configured `min_password_length` (off by default) only
    /// applies in that case. A wrong password leaves the store Locked.
    pub fn unlock(&self, password: &str) -> VaultResult<()> {
        if password.is_empty() {
            return Err(VaultError::invalid_input("Password must be a non-empty string"));
        }

        let mut state = self.state()?;
        *state = StoreState::Locked;

        let keyring = match self.backend.load(&self.settings.storage_key)? {
            Some(json) => Self::open_keyring(&json, password)?,
            None => {
                if password.chars().count() < self.settings.min_password_length {
                    return Err(VaultError::invalid_input(format!(
                        "Password must be at least {} characters",
                        self.settings.min_password_length
                    )));
                }
                log_debug!("keystore", "No persisted keyring, starting empty");
                Keyring::new()
            }
        };

        log_info!("keystore", "Key store unlocked", keys = keyring.len());
        *state = StoreState::Unlocked {
            password: SecretString::from(password.to_string()),
            keyring,
        };
        Ok(())
    }

    /// Forget the keyring and password. Also recovers a poisoned store.
    pub fn lock(&self) -> VaultResult<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = StoreState::Locked;
        drop(state);
        self.state.clear_poison();

        log_info!("keystore", "Key store locked");
        Ok(())
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state().as_deref(), Ok(StoreState::Unlocked { .. }))
    }

    fn ensure_unlocked(&self) -> VaultResult<()> {
        if self.is_unlocked() {
            Ok(())
        } else {
            Err(VaultError::storage_locked())
        }
    }

    /// Import a private key, returning its address
    pub fn add_key(&self, network: &str, symbol: &str, private_key: &str) -> VaultResult<String> {
        self.ensure_unlocked()?;
        let network = parse_network(network)?;
        require_non_empty(symbol, "Symbol")?;
        let private_key = require_non_empty(private_key, "Private Key")?;

        let wallet = for_network(network);
        let symbol: NetworkSymbol = wallet.resolve_symbol(symbol)?;
        let address = wallet.derive_address(&symbol, private_key)?;

        self.mutate(|keyring| {
            keyring.insert(network, symbol.clone(), address.clone(), private_key.to_string());
            Ok(())
        })?;

        log_info!("keystore", "Key added", network = network, symbol = symbol, address = address);
        Ok(address)
    }

    /// The private key stored for an address
    pub fn get_private_key(&self, network: &str, address: &str) -> VaultResult<String> {
        self.ensure_unlocked()?;
        let network = parse_network(network)?;
        let address = canonical_address(network, require_non_empty(address, "Wallet Address")?);

        self.read(|keyring| {
            keyring
                .get(network, &address)
                .map(str::to_string)
                .ok_or_else(VaultError::key_not_found)
        })
    }

    /// Delete the key stored for an address
    pub fn remove_private_key(&self, network: &str, address: &str) -> VaultResult<()> {
        self.ensure_unlocked()?;
        let network = parse_network(network)?;
        let address = canonical_address(network, require_non_empty(address, "Wallet Address")?);

        self.mutate(|keyring| {
            if keyring.remove(network, &address) {
                Ok(())
            } else {
                Err(VaultError::key_not_found())
            }
        })?;

        log_info!("keystore", "Key removed", network = network, address = address);
        Ok(())
    }

    /// Stored addresses, sorted, grouped by network and symbol
    pub fn list_keys(&self) -> VaultResult<KeyListing> {
        self.read(|keyring| Ok(keyring.listing()))
    }
}

/// Addresses are keyed by their canonical form; anything that fails to
/// validate is looked up as given.
fn canonical_address(network: NetworkId, address: &str) -> String {
    for_network(network)
        .validate_address(address)
        .unwrap_or_else(|_| address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::security_config::KdfParams;
    use std::sync::atomic::{AtomicBool, Ordering};

    const PASSWORD: &str = "correct horse battery";
    const ETH_KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";

    fn fast_settings() -> SecuritySettings {
        SecuritySettings::standard().with_kdf(KdfParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
    }

    fn fast_store() -> KeyStore<MemoryBlobStore> {
        KeyStore::with_settings(MemoryBlobStore::new(), fast_settings())
    }

    /// Memory backend whose writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryBlobStore,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn write_error() -> VaultError {
            VaultError::storage_error("Failed to write key store").with_details("disk full")
        }
    }

    impl BlobStore for FlakyStore {
        fn load(&self, key: &str) -> VaultResult<Option<String>> {
            self.inner.load(key)
        }

        fn store(&self, key: &str, blob: &str) -> VaultResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Self::write_error());
            }
            self.inner.store(key, blob)
        }

        fn update(&self, key: &str, change: &mut BlobUpdate<'_>) -> VaultResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                change(self.inner.load(key)?)?;
                return Err(Self::write_error());
            }
            self.inner.update(key, change)
        }
    }

    #[test]
    fn test_locked_operations_fail() {
        let store = fast_store();
        assert!(!store.is_unlocked());
        assert_eq!(store.add_key("ethereum", "1", ETH_KEY).unwrap_err().code, ErrorCode::StorageLocked);
        assert_eq!(store.add_key("ethereum", "1", "0x").unwrap_err().code, ErrorCode::StorageLocked);
        assert_eq!(store.get_private_key("ethereum", "0xabc").unwrap_err().code, ErrorCode::StorageLocked);
        assert_eq!(store.remove_private_key("ethereum", "0xabc").unwrap_err().code, ErrorCode::StorageLocked);
        assert_eq!(store.list_keys().unwrap_err().code, ErrorCode::StorageLocked);
    }

    #[test]
    fn test_first_unlock_creates_nothing_until_add() {
        let store = fast_store();
        store.unlock(PASSWORD).unwrap();
        assert!(store.is_unlocked());
        assert!(store.list_keys().unwrap().is_empty());
        assert_eq!(store.backend().load("privKeys").unwrap(), None);
    }

    #[test]
    fn test_any_password_opens_empty_store() {
        let store = fast_store();
        assert_eq!(store.unlock("").unwrap_err().code, ErrorCode::InvalidInput);

        store.unlock("pw").unwrap();
        assert!(store.is_unlocked());
        let address = store.add_key("ethereum", "1", ETH_KEY).unwrap();

        store.lock().unwrap();
        store.unlock("pw").unwrap();
        assert_eq!(store.get_private_key("ethereum", &address).unwrap(), ETH_KEY);
    }

    #[test]
    fn test_minimum_length_applies_to_new_vault_only() {
        let backend = std::sync::Arc::new(MemoryBlobStore::new());
        let store = KeyStore::with_settings(backend.clone(), fast_settings().with_min_password_length(8));
        assert_eq!(store.unlock("short").unwrap_err().code, ErrorCode::InvalidInput);
        assert!(!store.is_unlocked());

        // An existing blob was created elsewhere with a short password
        let creator = KeyStore::with_settings(backend, fast_settings());
        creator.unlock("short").unwrap();
        creator.add_key("ethereum", "1", ETH_KEY).unwrap();

        store.unlock("short").unwrap();
        assert!(store.is_unlocked());
    }

    #[test]
    fn test_add_get_remove() {
        let store = fast_store();
        store.unlock(PASSWORD).unwrap();

        let address = store.add_key("ethereum", "1", ETH_KEY).unwrap();
        assert_eq!(store.get_private_key("ethereum", &address).unwrap(), ETH_KEY);
        // Lowercase lookup finds the checksummed entry
        assert_eq!(store.get_private_key("ethereum", &address.to_lowercase()).unwrap(), ETH_KEY);

        store.remove_private_key("ethereum", &address).unwrap();
        assert_eq!(store.get_private_key("ethereum", &address).unwrap_err().code, ErrorCode::KeyNotFound);
        assert_eq!(store.remove_private_key("ethereum", &address).unwrap_err().code, ErrorCode::KeyNotFound);
        assert!(store.list_keys().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_password_stays_locked() {
        let store = fast_store();
        store.unlock(PASSWORD).unwrap();
        store.add_key("ethereum", "1", ETH_KEY).unwrap();
        store.lock().unwrap();

        assert_eq!(store.unlock("wrong password!").unwrap_err().code, ErrorCode::IncorrectPassword);
        assert!(!store.is_unlocked());

        // Short passwords are fine once a vault exists; this one is just wrong
        assert_eq!(store.unlock("x").unwrap_err().code, ErrorCode::IncorrectPassword);
    }

    #[test]
    fn test_invalid_key_does_not_persist() {
        let store = fast_store();
        store.unlock(PASSWORD).unwrap();
        assert_eq!(store.add_key("ethereum", "1", "0x").unwrap_err().code, ErrorCode::InvalidPrivateKey);
        assert_eq!(store.add_key("bitcoin", "DOGE", "5Hp").unwrap_err().code, ErrorCode::UnsupportedSymbol);
        assert_eq!(store.backend().load("privKeys").unwrap(), None);
    }

    #[test]
    fn test_failed_save_keeps_blob_and_cache() {
        let store = KeyStore::with_settings(FlakyStore::default(), fast_settings());
        store.unlock(PASSWORD).unwrap();
        let address = store.add_key("ethereum", "1", ETH_KEY).unwrap();
        let blob = store.backend().load("privKeys").unwrap();
        let listing = store.list_keys().unwrap();

        store.backend().fail_writes.store(true, Ordering::SeqCst);
        let seed = "11".repeat(32);
        assert_eq!(store.add_key("lamden", "TAU", &seed).unwrap_err().code, ErrorCode::StorageError);
        assert_eq!(store.remove_private_key("ethereum", &address).unwrap_err().code, ErrorCode::StorageError);

        assert_eq!(store.backend().load("privKeys").unwrap(), blob);
        assert_eq!(store.list_keys().unwrap(), listing);
        assert_eq!(store.get_private_key("ethereum", &address).unwrap(), ETH_KEY);

        store.backend().fail_writes.store(false, Ordering::SeqCst);
        store.lock().unwrap();
        store.unlock(PASSWORD).unwrap();
        assert_eq!(store.list_keys().unwrap(), listing);
    }

    #[test]
    fn test_tampered_kdf_params_rejected_on_unlock() {
        let store = fast_store();
        store.unlock(PASSWORD).unwrap();
        store.add_key("ethereum", "1", ETH_KEY).unwrap();
        store.lock().unwrap();

        let mut blob = EncryptedBlob::from_json(&store.backend().load("privKeys").unwrap().unwrap()).unwrap();
        blob.kdf_params.time_cost = 20_000;
        store.backend().store("privKeys", &blob.to_json().unwrap()).unwrap();

        assert_eq!(store.unlock(PASSWORD).unwrap_err().code, ErrorCode::ParseError);
        assert!(!store.is_unlocked());
    }

    #[test]
    fn test_lock_recovers_poisoned_store() {
        let store = fast_store();
        store.unlock(PASSWORD).unwrap();
        store.add_key("ethereum", "1", ETH_KEY).unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.state.lock().unwrap();
            panic!("holder panicked");
        }));
        assert_eq!(store.list_keys().unwrap_err().code, ErrorCode::Internal);

        store.lock().unwrap();
        assert!(!store.is_unlocked());
        assert_eq!(store.list_keys().unwrap_err().code, ErrorCode::StorageLocked);

        store.unlock(PASSWORD).unwrap();
        assert_eq!(store.list_keys().unwrap()[&NetworkId::Ethereum]["mainnet"].len(), 1);
    }
}
