//! Password-based Authenticated Encryption
//!
//! Protects the keyring at rest using:
//! - AES-256-GCM for authenticated encryption
//! - Argon2id for key derivation from password
//! - Random salt and nonce for every save

#![allow(deprecated)] // GenericArray::from_slice deprecated in generic-array 1.x

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};
use crate::utils::security_config::KdfParams;

/// Format marker written into every blob
pub const BLOB_FORMAT: &str = "aes-256-gcm/argon2id";
/// Current envelope version
pub const BLOB_VERSION: u8 = 1;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Encrypted blob envelope, the only persisted form of the keyring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Cipher/KDF marker
    pub format: String,
    /// Envelope version
    pub version: u8,
    /// Salt used for key derivation (base64)
    pub salt: String,
    /// Nonce used for encryption (base64)
    pub nonce: String,
    /// Ciphertext with the GCM tag appended (base64)
    pub ciphertext: String,
    /// Key derivation parameters used for this blob
    pub kdf_params: KdfParams,
}

impl EncryptedBlob {
    pub fn to_json(&self) -> VaultResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> VaultResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| VaultError::parse_error("Invalid encrypted blob").with_details(e.to_string()))
    }
}

/// Encrypt `plaintext` under a key derived from `password`
pub fn encrypt(plaintext: &[u8], password: &str, kdf_params: &KdfParams) -> VaultResult<EncryptedBlob> {
    if kdf_params.exceeds(&KdfParams::MAX) {
        return Err(VaultError::invalid_input("KDF parameters exceed the supported maximum"));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt, kdf_params)?;

    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| VaultError::crypto_error(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::crypto_error(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedBlob {
        format: BLOB_FORMAT.to_string(),
        version: BLOB_VERSION,
        salt: base64_encode(&salt),
        nonce: base64_encode(&nonce_bytes),
        ciphertext: base64_encode(&ciphertext),
        kdf_params: *kdf_params,
    })
}

/// Decrypt a blob with `password`.
///
/// Envelope problems, including KDF parameters above [`KdfParams::MAX`],
/// are `ParseError`; an authentication-tag mismatch is `IncorrectPassword`.
pub fn decrypt(blob: &EncryptedBlob, password: &str) -> VaultResult<Zeroizing<Vec<u8>>> {
    if blob.format != BLOB_FORMAT || blob.version != BLOB_VERSION {
        return Err(VaultError::parse_error(format!(
            "Unsupported blob format: {} v{}",
            blob.format, blob.version
        )));
    }

    // The envelope is unauthenticated until the tag is checked
    if blob.kdf_params.exceeds(&KdfParams::MAX) {
        return Err(VaultError::parse_error("KDF parameters exceed the supported maximum"));
    }

    let salt = base64_decode(&blob.salt)?;
    let nonce_bytes = base64_decode(&blob.nonce)?;
    let ciphertext = base64_decode(&blob.ciphertext)?;

    if salt.len() != SALT_LEN {
        return Err(VaultError::parse_error("Invalid salt length"));
    }

    if nonce_bytes.len() != NONCE_LEN {
        return Err(VaultError::parse_error("Invalid nonce length"));
    }

    let key = derive_key(password, &salt, &blob.kdf_params)?;

    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| VaultError::crypto_error(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| VaultError::incorrect_password().with_details("authentication tag mismatch"))?;

    Ok(Zeroizing::new(plaintext))
}

/// Derive encryption key from password using Argon2id
fn derive_key(password: &str, salt: &[u8], params: &KdfParams) -> VaultResult<Zeroizing<[u8; 32]>> {
    use argon2::{Algorithm, Argon2, Params, Version};

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| VaultError::crypto_error(format!("Invalid KDF params: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| VaultError::crypto_error(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn base64_decode(s: &str) -> VaultResult<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| VaultError::parse_error(format!("Invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn fast_kdf() -> KdfParams {
        KdfParams { memory_cost: 1024, time_cost: 1, parallelism: 1 }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let plaintext = br#"{"bitcoin":{"BTC":{"1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm":"5Hp..."}}}"#;
        let blob = encrypt(plaintext, "correct horse", &fast_kdf()).unwrap();
        let decrypted = decrypt(&blob, "correct horse").unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_wrong_password_is_authentication_failure() {
        let blob = encrypt(b"secret data", "correct_password", &fast_kdf()).unwrap();
        let err = decrypt(&blob, "wrong_password").unwrap_err();
        assert_eq!(err.code, ErrorCode::IncorrectPassword);
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        use base64::Engine;
        let mut blob = encrypt(b"secret data", "password", &fast_kdf()).unwrap();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(&blob.ciphertext)
            .unwrap();
        bytes[0] ^= 0x01;
        blob.ciphertext = base64::engine::general_purpose::STANDARD.encode(bytes);

        let err = decrypt(&blob, "password").unwrap_err();
        assert_eq!(err.code, ErrorCode::IncorrectPassword);
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        let mut blob = encrypt(b"data", "password", &fast_kdf()).unwrap();
        blob.format = "cryptojs-aes".to_string();
        assert_eq!(decrypt(&blob, "password").unwrap_err().code, ErrorCode::ParseError);

        let err = EncryptedBlob::from_json("{not json").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }

    #[test]
    fn test_oversized_kdf_params_rejected() {
        let mut blob = encrypt(b"data", "password", &fast_kdf()).unwrap();
        blob.kdf_params.time_cost = 20_000;
        assert_eq!(decrypt(&blob, "password").unwrap_err().code, ErrorCode::ParseError);

        blob.kdf_params = KdfParams { memory_cost: u32::MAX, ..fast_kdf() };
        assert_eq!(decrypt(&blob, "password").unwrap_err().code, ErrorCode::ParseError);

        let too_big = KdfParams { parallelism: 64, ..KdfParams::MAX };
        assert_eq!(encrypt(b"data", "password", &too_big).unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_different_encryptions_produce_different_output() {
        let a = encrypt(b"same data", "same_password", &fast_kdf()).unwrap();
        let b = encrypt(b"same data", "same_password", &fast_kdf()).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_blob_json_roundtrip() {
        let blob = encrypt(b"data", "password", &fast_kdf()).unwrap();
        let parsed = EncryptedBlob::from_json(&blob.to_json().unwrap()).unwrap();
        assert_eq!(parsed, blob);
        assert_eq!(parsed.kdf_params, fast_kdf());
    }
}
