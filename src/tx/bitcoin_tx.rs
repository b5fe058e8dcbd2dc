//! Bitcoin transaction signing
//!
//! Takes a hex-encoded legacy transaction, signs it with a WIF key and
//! returns the serialized result. Input 0 carrying a custom redeem script
//! goes through [`legacy_script`](super::legacy_script); everything else
//! is signed as P2PKH.

use bitcoin::consensus::encode;
use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{PrivateKey, ScriptBuf, Transaction};

use super::legacy_script::{classify_input_script, sign_redeem_script_input, InputScriptType};
use crate::bitcoin_wallet::{decode_wif, network_for_symbol};
use crate::error::{ErrorCode, VaultError, VaultResult};
use crate::utils::decode_hex_non_empty;
use crate::{log_debug, log_warn};

/// Parse a hex transaction without touching the caller's string
pub fn decode_bitcoin_transaction(raw_transaction: &str) -> VaultResult<Transaction> {
    let bytes = decode_hex_non_empty(raw_transaction, "Raw Transaction")?;
    encode::deserialize(&bytes).map_err(|e| {
        VaultError::new(ErrorCode::InvalidTransaction, "Invalid bitcoin transaction").with_details(e.to_string())
    })
}

/// Sign every unsigned P2PKH input with `key`.
///
/// Inputs that already carry signatures are left alone so partially
/// signed transactions can be completed.
fn sign_p2pkh_inputs(tx: &Transaction, key: &PrivateKey) -> VaultResult<Transaction> {
    let secp = Secp256k1::signing_only();
    let public_key = key.public_key(&secp);
    let script_code = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());

    let cache = SighashCache::new(tx);
    let mut signed = tx.clone();

    for (index, input) in tx.input.iter().enumerate() {
        match classify_input_script(&input.script_sig)? {
            InputScriptType::Empty => {}
            InputScriptType::NonStandard => {
                return Err(VaultError::signing_failed("Signing failed")
                    .with_details(format!("input {} has a non-standard script", index)));
            }
            _ => {
                log_debug!("tx", "Input already signed", index = index);
                continue;
            }
        }

        let sighash = cache
            .legacy_signature_hash(index, &script_code, EcdsaSighashType::All.to_u32())
            .map_err(|e| VaultError::signing_failed("Signing failed").with_details(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = ecdsa::Signature::sighash_all(secp.sign_ecdsa(&message, &key.inner));

        let signature = PushBytesBuf::try_from(signature.to_vec())
            .map_err(|e| VaultError::signing_failed("Signing failed").with_details(e.to_string()))?;
        signed.input[index].script_sig = Builder::new()
            .push_slice(signature)
            .push_key(&public_key)
            .into_script();
    }

    Ok(signed)
}

fn sign(raw_transaction: &str, private_key: &str, symbol: &str) -> VaultResult<String> {
    let network = network_for_symbol(symbol)?;
    let tx = decode_bitcoin_transaction(raw_transaction)?;
    let key = decode_wif(private_key, network)?;

    let first = tx
        .input
        .first()
        .ok_or_else(|| VaultError::new(ErrorCode::InvalidTransaction, "Transaction has no inputs"))?;

    let signed = if classify_input_script(&first.script_sig)? == InputScriptType::NonStandard {
        log_debug!("tx", "Signing bitcoin redeem script input", symbol = symbol, inputs = tx.input.len());
        sign_redeem_script_input(&tx, &key)?
    } else {
        log_debug!("tx", "Signing bitcoin P2PKH inputs", symbol = symbol, inputs = tx.input.len());
        sign_p2pkh_inputs(&tx, &key)?
    };

    Ok(hex::encode(encode::serialize(&signed)))
}

/// Sign a raw bitcoin transaction for `symbol` (`BTC` or `BTCTEST`).
///
/// Every failure on this path is reported as `SigningFailed`; the original
/// error is kept in `details`.
pub fn sign_bitcoin_transaction(raw_transaction: &str, private_key: &str, symbol: &str) -> VaultResult<String> {
    sign(raw_transaction, private_key, symbol).map_err(|e| {
        log_warn!("tx", "Bitcoin signing failed", code = format!("{:?}", e.code));
        if e.code == ErrorCode::SigningFailed {
            e
        } else {
            e.recode(ErrorCode::SigningFailed, "Signing failed")
        }
    })
}
