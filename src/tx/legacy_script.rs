//! Legacy redeem-script signer
//!
//! Some deployed contracts (atomic swaps, HTLCs) hand us an unsigned
//! transaction whose first input already carries a custom redeem script
//! at the end of its `script_sig`. Generic P2PKH signing cannot handle
//! that input, so it is signed here against the embedded redeem script
//! and the final `script_sig` is assembled by hand:
//!
//! ```text
//! <signature> <pubkey> <original script_sig ops ...>
//! ```

use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKMULTISIG, OP_CODESEPARATOR, OP_PUSHNUM_1, OP_PUSHNUM_16, OP_PUSHNUM_NEG1};
use bitcoin::opcodes::Opcode;
use bitcoin::script::{Builder, Instruction, PushBytes, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{PrivateKey, PublicKey, Script, ScriptBuf, Transaction};

use crate::error::{ErrorCode, VaultError, VaultResult};

/// How an input's `script_sig` looks before signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputScriptType {
    /// Nothing there yet
    Empty,
    /// `<sig> <pubkey>`
    PubkeyHash,
    /// `<sig>`
    Pubkey,
    /// `OP_0 <sig|OP_0>...`
    Multisig,
    /// Push-only stack ending in a standard redeem script
    ScriptHash,
    /// Anything else, typically a custom redeem script
    NonStandard,
}

impl InputScriptType {
    /// Whether the input already carries a signature
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            InputScriptType::PubkeyHash
                | InputScriptType::Pubkey
                | InputScriptType::Multisig
                | InputScriptType::ScriptHash
        )
    }
}

pub(crate) fn decompile(script: &Script) -> VaultResult<Vec<Instruction<'_>>> {
    script
        .instructions()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            VaultError::new(ErrorCode::InvalidTransaction, "Invalid input script").with_details(e.to_string())
        })
}

fn is_canonical_signature(bytes: &[u8]) -> bool {
    ecdsa::Signature::from_slice(bytes).is_ok()
}

fn is_canonical_pubkey(bytes: &[u8]) -> bool {
    PublicKey::from_slice(bytes).is_ok()
}

fn pushnum(op: Opcode) -> Option<u8> {
    let code = op.to_u8();
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
        Some(code - OP_PUSHNUM_1.to_u8() + 1)
    } else {
        None
    }
}

/// `m <pubkey>... n OP_CHECKMULTISIG`
fn is_multisig_output(script: &Script) -> bool {
    let Ok(ops) = decompile(script) else {
        return false;
    };
    if ops.len() < 4 {
        return false;
    }
    let (Some(Instruction::Op(first)), Some(Instruction::Op(last))) = (ops.first(), ops.last()) else {
        return false;
    };
    let Instruction::Op(n_op) = ops[ops.len() - 2] else {
        return false;
    };
    let (Some(m), Some(n)) = (pushnum(*first), pushnum(n_op)) else {
        return false;
    };
    let keys = &ops[1..ops.len() - 2];

    *last == OP_CHECKMULTISIG
        && m <= n
        && keys.len() == n as usize
        && keys
            .iter()
            .all(|ins| matches!(ins, Instruction::PushBytes(b) if is_canonical_pubkey(b.as_bytes())))
}

fn is_standard_output(script: &Script) -> bool {
    script.is_p2pkh()
        || script.is_p2pk()
        || script.is_p2sh()
        || script.is_p2wpkh()
        || script.is_p2wsh()
        || is_multisig_output(script)
}

/// Classify an input script the way a transaction builder would when
/// re-hydrating a partially signed transaction.
pub fn classify_input_script(script: &Script) -> VaultResult<InputScriptType> {
    let ops = decompile(script)?;
    if ops.is_empty() {
        return Ok(InputScriptType::Empty);
    }

    let pushes: Option<Vec<&[u8]>> = ops
        .iter()
        .map(|ins| match ins {
            Instruction::PushBytes(b) => Some(b.as_bytes()),
            Instruction::Op(_) => None,
        })
        .collect();
    let Some(pushes) = pushes else {
        return Ok(InputScriptType::NonStandard);
    };

    let kind = match pushes.as_slice() {
        [sig, key] if is_canonical_signature(sig) && is_canonical_pubkey(key) => InputScriptType::PubkeyHash,
        [sig] if is_canonical_signature(sig) => InputScriptType::Pubkey,
        [first, rest @ ..]
            if first.is_empty()
                && !rest.is_empty()
                && rest.iter().all(|s| s.is_empty() || is_canonical_signature(s)) =>
        {
            InputScriptType::Multisig
        }
        [.., redeem] if !redeem.is_empty() && is_standard_output(Script::from_bytes(redeem)) => {
            InputScriptType::ScriptHash
        }
        _ => InputScriptType::NonStandard,
    };

    Ok(kind)
}

/// Push data the way a script compiler does: single bytes 1..=16 and
/// 0x81 become their small-integer opcodes.
fn push_minimal(builder: Builder, bytes: &PushBytes) -> Builder {
    match bytes.as_bytes() {
        [n @ 1..=16] => builder.push_opcode(Opcode::from(OP_PUSHNUM_1.to_u8() + n - 1)),
        [0x81] => builder.push_opcode(OP_PUSHNUM_NEG1),
        _ => builder.push_slice(bytes),
    }
}

fn push_instruction(builder: Builder, instruction: &Instruction<'_>) -> Builder {
    match *instruction {
        Instruction::Op(op) => builder.push_opcode(op),
        Instruction::PushBytes(bytes) => push_minimal(builder, bytes),
    }
}

/// Script code for the legacy sighash: OP_CODESEPARATORs removed and the
/// script recompiled.
fn script_code(redeem_script: &Script) -> VaultResult<ScriptBuf> {
    let builder = decompile(redeem_script)?
        .iter()
        .filter(|ins| !matches!(ins, Instruction::Op(op) if *op == OP_CODESEPARATOR))
        .fold(Builder::new(), push_instruction);
    Ok(builder.into_script())
}

fn to_push_bytes(bytes: Vec<u8>) -> VaultResult<PushBytesBuf> {
    PushBytesBuf::try_from(bytes)
        .map_err(|e| VaultError::signing_failed("Signing failed").with_details(e.to_string()))
}

/// Signing state for the first input of a transaction spending a custom
/// redeem script.
#[derive(Debug, Clone)]
pub struct RedeemScriptInput {
    /// The P2SH output the input is treated as spending
    pub prev_out_script: ScriptBuf,
    /// The contract extracted from the input's `script_sig`
    pub redeem_script: ScriptBuf,
    pub public_key: PublicKey,
    /// Empty until `sign` succeeds
    pub signature: Option<ecdsa::Signature>,
}

impl RedeemScriptInput {
    /// Extract the redeem script from input 0 and prepare a P2SH signing slot
    pub fn from_transaction(tx: &Transaction, key: &PrivateKey) -> VaultResult<Self> {
        let input = tx
            .input
            .first()
            .ok_or_else(|| VaultError::signing_failed("Signing failed").with_details("transaction has no inputs"))?;

        let redeem_script = match decompile(&input.script_sig)?.last() {
            Some(Instruction::PushBytes(bytes)) if !bytes.is_empty() => ScriptBuf::from(bytes.as_bytes().to_vec()),
            _ => {
                return Err(VaultError::signing_failed("Signing failed")
                    .with_details("input 0 does not end with a redeem script push"))
            }
        };

        let secp = Secp256k1::signing_only();
        Ok(Self {
            prev_out_script: ScriptBuf::new_p2sh(&redeem_script.script_hash()),
            redeem_script,
            public_key: key.public_key(&secp),
            signature: None,
        })
    }

    /// Sign input 0 against the redeem script with SIGHASH_ALL
    pub fn sign(&mut self, tx: &Transaction, key: &PrivateKey) -> VaultResult<()> {
        let script_code = script_code(&self.redeem_script)?;
        let sighash = SighashCache::new(tx)
            .legacy_signature_hash(0, &script_code, EcdsaSighashType::All.to_u32())
            .map_err(|e| VaultError::signing_failed("Signing failed").with_details(e.to_string()))?;

        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(sighash.to_byte_array());
        self.signature = Some(ecdsa::Signature::sighash_all(secp.sign_ecdsa(&message, &key.inner)));
        Ok(())
    }

    /// `<sig> <pubkey>` followed by every op of the original `script_sig`
    pub fn final_script_sig(&self, original: &Script) -> VaultResult<ScriptBuf> {
        let signature = self
            .signature
            .ok_or_else(|| VaultError::signing_failed("Signing failed").with_details("input 0 is not signed"))?;

        let builder = Builder::new()
            .push_slice(to_push_bytes(signature.to_vec())?)
            .push_key(&self.public_key);

        let builder = decompile(original)?.iter().fold(builder, push_instruction);
        Ok(builder.into_script())
    }
}

/// Sign the first input of `tx` against the redeem script embedded in its
/// `script_sig`, returning the signed copy.
///
/// Only input 0 is touched; the input script is overwritten directly.
pub fn sign_redeem_script_input(tx: &Transaction, key: &PrivateKey) -> VaultResult<Transaction> {
    let mut input = RedeemScriptInput::from_transaction(tx, key)?;
    input.sign(tx, key)?;

    let mut signed = tx.clone();
    signed.input[0].script_sig = input.final_script_sig(&tx.input[0].script_sig)?;
    Ok(signed)
}
