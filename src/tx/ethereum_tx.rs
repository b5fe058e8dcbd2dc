//! Ethereum transaction signing
//!
//! Raw input is a legacy RLP transaction: either the 6-field unsigned list
//! or the 9-field EIP-155 signing payload `[..., chain_id, 0, 0]`. The
//! signed output is the EIP-155 encoded transaction as lowercase hex.

use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::TransactionRequest;
use ethers_core::utils::rlp::Rlp;
use ethers_signers::{LocalWallet, Signer};

use crate::error::{ErrorCode, VaultError, VaultResult};
use crate::types::NetworkId;
use crate::utils::{decode_hex, decode_hex_non_empty, encode_hex};
use crate::log_debug;

/// Named chains accepted as ethereum symbols
pub const NAMED_CHAINS: &[(&str, u64)] = &[
    ("mainnet", 1),
    ("ropsten", 3),
    ("rinkeby", 4),
    ("goerli", 5),
    ("kovan", 42),
    ("sepolia", 11155111),
];

/// Chain id for an ethereum symbol: a chain name or a decimal id
pub fn resolve_chain_id(symbol: &str) -> VaultResult<u64> {
    let symbol = symbol.trim();
    let lower = symbol.to_ascii_lowercase();

    if let Some((_, id)) = NAMED_CHAINS.iter().find(|(name, _)| *name == lower) {
        return Ok(*id);
    }
    symbol
        .parse::<u64>()
        .map_err(|_| VaultError::unsupported_symbol(NetworkId::Ethereum, symbol))
}

/// Decode a hex private key into its 32 raw bytes
pub fn decode_private_key(private_key: &str) -> VaultResult<zeroize::Zeroizing<Vec<u8>>> {
    let bytes = zeroize::Zeroizing::new(decode_hex(private_key).map_err(|e| {
        VaultError::invalid_private_key("Missing or invalid Private Key").with_details(e.message)
    })?);

    if bytes.is_empty() {
        return Err(VaultError::invalid_private_key("Missing or invalid Private Key"));
    }
    if bytes.len() != 32 {
        return Err(VaultError::invalid_private_key("Invalid Private Key length")
            .with_details(format!("expected 32 bytes, got {}", bytes.len())));
    }
    Ok(bytes)
}

/// Local signer for a raw secp256k1 key
pub fn wallet_from_key(private_key: &str) -> VaultResult<LocalWallet> {
    let bytes = decode_private_key(private_key)?;
    LocalWallet::from_bytes(&bytes).map_err(|e| {
        VaultError::invalid_private_key("Missing or invalid Private Key").with_details(e.to_string())
    })
}

/// Decode a legacy unsigned transaction.
///
/// A chain id carried in a 9-field payload has to agree with `chain_id`.
pub fn decode_unsigned_legacy(raw_transaction: &str, chain_id: u64) -> VaultResult<TransactionRequest> {
    let bytes = decode_hex_non_empty(raw_transaction, "Raw Transaction")?;
    let invalid = |details: String| {
        VaultError::new(ErrorCode::InvalidTransaction, "Invalid ethereum transaction").with_details(details)
    };

    let rlp = Rlp::new(&bytes);
    if !rlp.is_list() {
        return Err(invalid("typed transaction envelopes are not supported".into()));
    }
    let list_len = rlp.payload_info().map_err(|e| invalid(e.to_string()))?.total();
    if list_len != bytes.len() {
        return Err(invalid(format!(
            "{} trailing bytes after the transaction",
            bytes.len().saturating_sub(list_len)
        )));
    }
    let fields = rlp.item_count().map_err(|e| invalid(e.to_string()))?;
    if fields != 6 && fields != 9 {
        return Err(invalid(format!("expected 6 or 9 RLP fields, got {}", fields)));
    }

    let mut tx = TransactionRequest::decode_unsigned_rlp(&rlp).map_err(|e| invalid(e.to_string()))?;

    if let Some(embedded) = tx.chain_id {
        if embedded.as_u64() != chain_id {
            return Err(invalid(format!(
                "payload chain id {} does not match {}",
                embedded, chain_id
            )));
        }
    }
    tx.chain_id = Some(chain_id.into());
    Ok(tx)
}

fn sign(raw_transaction: &str, wallet: &LocalWallet, chain_id: u64) -> VaultResult<String> {
    let tx: TypedTransaction = decode_unsigned_legacy(raw_transaction, chain_id)?.into();
    let signature = wallet
        .sign_transaction_sync(&tx)
        .map_err(|e| VaultError::signing_failed("Signing failed").with_details(e.to_string()))?;
    Ok(encode_hex(tx.rlp_signed(&signature)))
}

/// Sign a raw ethereum transaction on the chain named by `symbol`.
///
/// Key problems surface as `InvalidPrivateKey`, an unknown chain as
/// `UnsupportedSymbol`; anything else is `SigningFailed`.
pub fn sign_ethereum_transaction(raw_transaction: &str, private_key: &str, symbol: &str) -> VaultResult<String> {
    let chain_id = resolve_chain_id(symbol)?;
    let wallet = wallet_from_key(private_key)?.with_chain_id(chain_id);

    log_debug!("tx", "Signing ethereum transaction", chain_id = chain_id);
    sign(raw_transaction, &wallet, chain_id).map_err(|e| match e.code {
        ErrorCode::SigningFailed => e,
        _ => e.recode(ErrorCode::SigningFailed, "Signing failed"),
    })
}
