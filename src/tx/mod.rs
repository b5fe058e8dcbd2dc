//! Transaction Module
//!
//! Signing of caller-supplied raw transactions for each network.

mod bitcoin_tx;
mod ethereum_tx;
pub mod legacy_script;
mod signer;

pub use bitcoin_tx::{decode_bitcoin_transaction, sign_bitcoin_transaction};
pub use ethereum_tx::{
    decode_private_key, decode_unsigned_legacy, resolve_chain_id, sign_ethereum_transaction, wallet_from_key,
    NAMED_CHAINS,
};
pub use signer::sign_transaction;
