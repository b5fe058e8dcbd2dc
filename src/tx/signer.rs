//! Transaction Signer
//!
//! Single entry point that validates arguments and hands the raw
//! transaction to the network's wallet.

use crate::error::VaultResult;
use crate::types::NetworkSymbol;
use crate::utils::require_non_empty;
use crate::wallet::{for_network, parse_network};
use crate::log_info;

/// Sign a hex-encoded raw transaction.
///
/// `symbol` selects network parameters: `BTC`/`BTCTEST` on bitcoin, the
/// chain name or id on ethereum. The caller's strings are never modified.
pub fn sign_transaction(
    raw_transaction: &str,
    private_key: &str,
    network: &str,
    symbol: &str,
) -> VaultResult<String> {
    let network = parse_network(network)?;
    let raw_transaction = require_non_empty(raw_transaction, "Raw Transaction")?;
    let private_key = require_non_empty(private_key, "Private Key")?;
    let symbol = NetworkSymbol::new(symbol)?;

    log_info!("tx", "Signing transaction", network = network, symbol = symbol);
    for_network(network).sign_transaction(raw_transaction, private_key, &symbol)
}
