//! Utilities Module
//!
//! Common utilities used across the crate.

mod hex_codec;
pub mod crypto;
pub mod encryption;
pub mod logging;
pub mod security_config;

pub use crypto::*;
pub use hex_codec::*;
