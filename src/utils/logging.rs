//! Structured Logging with Sensitive Data Redaction
//!
//! Entries carry a module tag and key/value fields and are written to
//! stderr. Field values are redacted by key name before formatting:
//! - keys, WIFs, seeds and passwords are replaced entirely
//! - addresses keep a short prefix and suffix
//! - transaction hex keeps a short prefix and suffix
//!
//! Debug entries are dropped unless enabled with [`enable_debug`] or the
//! `VAULT_DEBUG` environment variable (`1` or `true`).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static ENV_INIT: Once = Once::new();

pub fn enable_debug() {
    ENV_INIT.call_once(|| {});
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

pub fn disable_debug() {
    ENV_INIT.call_once(|| {});
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

/// Whether debug entries are emitted; reads `VAULT_DEBUG` on first use
pub fn is_debug_enabled() -> bool {
    ENV_INIT.call_once(|| {
        if debug_requested(std::env::var("VAULT_DEBUG").ok().as_deref()) {
            DEBUG_ENABLED.store(true, Ordering::SeqCst);
        }
    });
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

fn debug_requested(value: Option<&str>) -> bool {
    value
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// How a field value is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redaction {
    Full,
    Address,
    Hex,
    Plain,
}

const SECRET_KEYS: &[&str] = &[
    "private_key", "privatekey", "secret", "seed", "password", "passphrase",
    "wif", "private", "key_hex", "signing_key", "plaintext",
];
const ADDRESS_KEYS: &[&str] = &["address", "recipient", "sender"];
const HEX_KEYS: &[&str] = &["txid", "tx_hash", "hash", "raw_tx", "signed_tx"];

impl Redaction {
    fn for_key(key: &str) -> Self {
        let key = key.to_ascii_lowercase();
        let matches = |list: &[&str]| list.iter().any(|k| key.contains(k));

        if matches(SECRET_KEYS) {
            Redaction::Full
        } else if matches(ADDRESS_KEYS) {
            Redaction::Address
        } else if matches(HEX_KEYS) {
            Redaction::Hex
        } else {
            Redaction::Plain
        }
    }

    fn apply(self, value: &str) -> String {
        match self {
            Redaction::Full => redact_value(value),
            Redaction::Address => redact_address(value),
            Redaction::Hex => redact_hex(value),
            Redaction::Plain => value.to_string(),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacted according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value = Redaction::for_key(key).apply(&value.to_string());
        self.fields.push((key, value));
        self
    }

    fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            line.push_str(" | ");
            line.push_str(&fields);
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// First 6 (8 with `0x`) and last 4 characters
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    shorten(trimmed, prefix_len, 4)
}

/// First 10 (12 with `0x`) and last 6 characters
fn redact_hex(hex: &str) -> String {
    let trimmed = hex.trim();
    if trimmed.len() <= 20 {
        return trimmed.to_string();
    }
    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    shorten(trimmed, prefix_len, 6)
}

fn shorten(value: &str, prefix_len: usize, suffix_len: usize) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }
    if !value.is_ascii() || value.len() <= prefix_len + suffix_len + 3 {
        return redact_value(value);
    }
    format!("{}...{}", &value[..prefix_len], &value[value.len() - suffix_len..])
}

/// Convenience macro for debug logging
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for info logging
#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for warning logging
#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for error logging
#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}
