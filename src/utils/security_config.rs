//! Security Configuration
//!
//! Key store configuration with:
//! - Security level presets (standard, high, paranoid)
//! - Argon2id key-derivation parameters
//! - Validation of security settings

use serde::{Deserialize, Serialize};

/// Storage key under which the encrypted keyring blob lives
pub const DEFAULT_STORAGE_KEY: &str = "privKeys";

/// Key derivation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism
    pub parallelism: u32,
}

impl KdfParams {
    /// Largest parameters accepted from a blob (the paranoid preset)
    pub const MAX: KdfParams = KdfParams {
        memory_cost: 262144,
        time_cost: 6,
        parallelism: 4,
    };

    /// Whether any parameter is above `limit`
    pub fn exceeds(&self, limit: &KdfParams) -> bool {
        self.memory_cost > limit.memory_cost
            || self.time_cost > limit.time_cost
            || self.parallelism > limit.parallelism
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        // 64 MiB memory, 3 iterations, 4 parallel lanes
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Security settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Security level preset
    pub level: SecurityLevel,

    /// Password-based key derivation for the keyring blob
    pub kdf: KdfParams,
    /// Minimum password length when a new vault is created; 0 disables it
    pub min_password_length: usize,
    /// Storage key of the persisted blob
    pub storage_key: String,
}

/// Security level presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// Standard security - suitable for most users
    Standard,
    /// High security - for users with significant holdings
    High,
    /// Paranoid - maximum security, slower unlocks
    Paranoid,
    /// Custom - user-defined settings
    Custom,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl SecuritySettings {
    /// Standard security preset
    pub fn standard() -> Self {
        Self {
            level: SecurityLevel::Standard,
            kdf: KdfParams::default(),
            min_password_length: 0,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// High security preset
    pub fn high() -> Self {
        Self {
            level: SecurityLevel::High,
            kdf: KdfParams {
                memory_cost: 131072, // 128 MiB
                time_cost: 4,
                parallelism: 4,
            },
            min_password_length: 12,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Paranoid security preset
    pub fn paranoid() -> Self {
        Self {
            level: SecurityLevel::Paranoid,
            kdf: KdfParams::MAX, // 256 MiB, 6 iterations
            min_password_length: 16,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Replace the KDF parameters, marking the settings as custom
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self.level = SecurityLevel::Custom;
        self
    }

    /// Store the blob under a different key
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_min_password_length(mut self, len: usize) -> Self {
        self.min_password_length = len;
        self.level = SecurityLevel::Custom;
        self
    }

    /// Validate settings consistency
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.kdf.memory_cost < 19456 {
            warnings.push("KDF memory cost below 19 MiB weakens password protection".to_string());
        }
        if self.kdf.time_cost < 2 {
            warnings.push("KDF time cost below 2 iterations weakens password protection".to_string());
        }
        if self.kdf.parallelism == 0 || self.kdf.memory_cost < 8 * self.kdf.parallelism {
            warnings.push("KDF memory cost must be at least 8 KiB per lane".to_string());
        }
        if self.kdf.exceeds(&KdfParams::MAX) {
            warnings.push("KDF parameters above the paranoid preset cannot be saved".to_string());
        }
        if (1..8).contains(&self.min_password_length) {
            warnings.push("Minimum password length below 8 characters".to_string());
        }
        if self.storage_key.trim().is_empty() {
            warnings.push("Storage key is empty".to_string());
        }

        warnings
    }
}
