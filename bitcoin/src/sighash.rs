//! Signature-hash (sighash) preimage construction, covering both the pre-SegWit legacy algorithm
//! and the BIP-143 witness algorithm, including the historical SIGHASH_SINGLE digest bug.

use std::io::Write;

use txcore::{
    hashes::{dsha256, Hash256Digest},
    ser::ByteFormat,
};

use crate::{
    types::{
        script::{Script, ScriptSig},
        txout::TxOut,
        Transaction,
    },
    TxError,
};

/// The `SIGHASH_ANYONECANPAY` bit.
pub const ANYONECANPAY: u32 = 0x80;

/// The `SIGHASH_FORKID` bit, recognized by some Bitcoin-derived chains (e.g. Bitcoin Cash). This
/// core does not branch on it: it is carried verbatim into the trailing sighash-type word so a
/// caller targeting a FORKID-aware chain can set it and still get this chain's preimage layout.
pub const FORKID: u32 = 0x40;

/// The base sighash mode, decoded from the low bits of a `sighash_type`. Any value other than
/// `All`, `None`, or `Single` in that range normalizes to `All` (see `SighashFlag::from_u32`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SighashBase {
    /// Sign every input and every output.
    All = 0x01,
    /// Sign every input and no outputs.
    None = 0x02,
    /// Sign every input and only the output at the same index as the input being signed.
    Single = 0x03,
}

/// A decomposed `sighash_type`: its base mode, whether `ANYONECANPAY` is set, and the original
/// 32-bit value (carried verbatim into the preimage so FORKID and any chain-specific high bits
/// survive).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SighashFlag {
    /// The decoded base mode.
    pub base: SighashBase,
    /// Whether `ANYONECANPAY` was set.
    pub anyone_can_pay: bool,
    /// The original, un-normalized 32-bit sighash type, written verbatim as the preimage's
    /// trailing word.
    pub raw: u32,
}

impl SighashFlag {
    /// Decomposes a raw sighash type. An unrecognized base selector (anything but 1, 2, or 3 in
    /// the low byte) normalizes to `All` rather than erroring, per this core's Unsupported
    /// policy.
    pub fn from_u32(raw: u32) -> Self {
        let anyone_can_pay = raw & ANYONECANPAY != 0;
        let base = match raw & 0x1f {
            0x02 => SighashBase::None,
            0x03 => SighashBase::Single,
            _ => SighashBase::All,
        };
        Self {
            base,
            anyone_can_pay,
            raw,
        }
    }
}

/// An optional splice hook: insert `bytes` into the assembled preimage at `offset` (or append, if
/// `offset == u32::MAX`) before it is double-SHA-256'd. This is a general-purpose extension point
/// for preimage variants used by Bitcoin-derived chains, not a well-defined protocol feature of
/// Bitcoin itself; it is exercised by fixture tests, not derived from consensus rules.
#[derive(Copy, Clone, Debug)]
pub struct Extra<'a> {
    /// The bytes to insert.
    pub bytes: &'a [u8],
    /// The byte offset to insert at, or `u32::MAX` to append at the end.
    pub offset: u32,
}

fn splice_extra(mut preimage: Vec<u8>, extra: Option<Extra>) -> Vec<u8> {
    match extra {
        None => preimage,
        Some(Extra { bytes, offset }) => {
            let at = if offset == u32::MAX {
                preimage.len()
            } else {
                (offset as usize).min(preimage.len())
            };
            preimage.splice(at..at, bytes.iter().copied());
            preimage
        }
    }
}

fn legacy_sighash_prep(tx: &Transaction, index: usize, prevout_script: &Script) -> Transaction {
    let mut copy_tx = tx.clone();
    for i in 0..copy_tx.inputs().len() {
        let script_sig = if i == index {
            strip_codeseparators(prevout_script)
        } else {
            ScriptSig::null()
        };
        copy_tx.set_input_script_sig(i, script_sig).expect("index in range");
    }
    copy_tx
}

/// `OP_CODESEPARATOR`.
const OP_CODESEPARATOR: u8 = 0xab;

fn strip_codeseparators(script: &Script) -> ScriptSig {
    let stripped: Vec<u8> = script
        .items()
        .iter()
        .copied()
        .filter(|&b| b != OP_CODESEPARATOR)
        .collect();
    ScriptSig::from(stripped)
}

fn legacy_sighash_single(copy_tx: &mut Transaction, index: usize) {
    let mut outputs: Vec<TxOut> = (0..index).map(|_| TxOut::null()).collect();
    outputs.push(copy_tx.outputs()[index].clone());
    copy_tx.set_outputs(outputs);

    let inputs: Vec<_> = copy_tx
        .inputs()
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let mut input = input.clone();
            if i != index {
                input.sequence = 0;
            }
            input
        })
        .collect();
    copy_tx.set_inputs(inputs);
}

fn legacy_sighash_anyone_can_pay(copy_tx: &mut Transaction, index: usize) {
    copy_tx.set_inputs(vec![copy_tx.inputs()[index].clone()]);
}

/// The constant digest produced for `SIGHASH_SINGLE`/`SIGHASH_SINGLE|ANYONECANPAY` when the input
/// index being signed is not less than the number of outputs: the historical "SIGHASH_SINGLE
/// bug", reproduced verbatim rather than rejected (see DESIGN.md).
pub const SIGHASH_SINGLE_BUG_DIGEST: [u8; 32] = {
    let mut bytes = [0u8; 32];
    bytes[0] = 1;
    bytes
};

/// Computes the legacy (pre-SegWit) signature-hash digest for input `index`.
///
/// `prevout_script` is the script code substituted in place of that input's scriptSig (ordinarily
/// the previous output's scriptPubkey, or a redeem script). `sighash_type` is the raw 32-bit
/// sighash word; only its low byte is consensus-meaningful for this algorithm, but the full value
/// is written into the preimage's trailing word, so FORKID and chain-specific bits pass through
/// unexamined.
pub fn legacy_sighash(
    tx: &Transaction,
    index: usize,
    prevout_script: &Script,
    sighash_type: u32,
    extra: Option<Extra>,
) -> Result<Hash256Digest, TxError> {
    if index >= tx.inputs().len() {
        return Err(TxError::InvalidArgument(format!(
            "input index {} out of bounds",
            index
        )));
    }

    let flag = SighashFlag::from_u32(sighash_type);

    if flag.base == SighashBase::Single && index >= tx.outputs().len() {
        return Ok(Hash256Digest::from(SIGHASH_SINGLE_BUG_DIGEST));
    }

    let mut copy_tx = legacy_sighash_prep(tx, index, prevout_script);

    match flag.base {
        SighashBase::None => {
            copy_tx.set_outputs(vec![]);
            let inputs: Vec<_> = copy_tx
                .inputs()
                .iter()
                .enumerate()
                .map(|(i, input)| {
                    let mut input = input.clone();
                    if i != index {
                        input.sequence = 0;
                    }
                    input
                })
                .collect();
            copy_tx.set_inputs(inputs);
        }
        SighashBase::Single => legacy_sighash_single(&mut copy_tx, index),
        SighashBase::All => {}
    }

    if flag.anyone_can_pay {
        legacy_sighash_anyone_can_pay(&mut copy_tx, index);
    }

    let mut preimage = copy_tx.to_bytes_with(crate::types::EncodeFlags::NONE)?;
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    preimage = splice_extra(preimage, extra);

    Ok(dsha256(&preimage))
}

fn hash_prevouts(tx: &Transaction, flag: SighashFlag) -> Result<Hash256Digest, TxError> {
    if flag.anyone_can_pay {
        return Ok(Hash256Digest::default());
    }
    let mut buf = vec![];
    for input in tx.inputs() {
        input.outpoint.write_to(&mut buf)?;
    }
    Ok(dsha256(&buf))
}

fn hash_sequence(tx: &Transaction, flag: SighashFlag) -> Result<Hash256Digest, TxError> {
    if flag.anyone_can_pay || flag.base == SighashBase::Single || flag.base == SighashBase::None {
        return Ok(Hash256Digest::default());
    }
    let mut buf = vec![];
    for input in tx.inputs() {
        buf.write_all(&input.sequence.to_le_bytes())?;
    }
    Ok(dsha256(&buf))
}

fn hash_outputs(tx: &Transaction, index: usize, flag: SighashFlag) -> Result<Hash256Digest, TxError> {
    match flag.base {
        SighashBase::All => {
            let mut buf = vec![];
            for output in tx.outputs() {
                output.write_to(&mut buf)?;
            }
            Ok(dsha256(&buf))
        }
        SighashBase::Single => {
            if index >= tx.outputs().len() {
                Ok(Hash256Digest::default())
            } else {
                let mut buf = vec![];
                tx.outputs()[index].write_to(&mut buf)?;
                Ok(dsha256(&buf))
            }
        }
        SighashBase::None => Ok(Hash256Digest::default()),
    }
}

/// Computes the BIP-143 witness signature-hash digest for input `index`.
///
/// `script_code` is the script committed to by the signature (the scriptPubkey for a bare P2WPKH
/// spend, or the witness/redeem script for P2WSH); `prevout_value` is the satoshi value of the
/// output being spent. Unlike the legacy algorithm, BIP-143 has no "SIGHASH_SINGLE bug": when the
/// input index is not less than the number of outputs, `hash_outputs` is simply the zero digest,
/// per the BIP.
pub fn bip143_sighash(
    tx: &Transaction,
    index: usize,
    script_code: &Script,
    prevout_value: u64,
    sighash_type: u32,
    extra: Option<Extra>,
) -> Result<Hash256Digest, TxError> {
    let input = tx.inputs().get(index).ok_or_else(|| {
        TxError::InvalidArgument(format!("input index {} out of bounds", index))
    })?;

    let flag = SighashFlag::from_u32(sighash_type);

    let mut preimage = vec![];
    preimage.write_all(&tx.version().to_le_bytes())?;
    hash_prevouts(tx, flag)?.write_to(&mut preimage)?;
    hash_sequence(tx, flag)?.write_to(&mut preimage)?;
    input.outpoint.write_to(&mut preimage)?;
    script_code.write_to(&mut preimage)?;
    preimage.write_all(&prevout_value.to_le_bytes())?;
    preimage.write_all(&input.sequence.to_le_bytes())?;
    hash_outputs(tx, index, flag)?.write_to(&mut preimage)?;
    preimage.write_all(&tx.locktime().to_le_bytes())?;
    preimage.write_all(&sighash_type.to_le_bytes())?;

    preimage = splice_extra(preimage, extra);

    Ok(dsha256(&preimage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hashes::TXID,
        types::{Outpoint, ScriptPubkey, TxIn},
    };

    fn one_in_one_out(sequence: u32) -> Transaction {
        let mut tx = Transaction::new(0);
        let mut input = TxIn::new(Outpoint::new(TXID::default(), 0));
        input.sequence = sequence;
        tx.add_input(input);
        tx.add_output(TxOut::new(100_000, ScriptPubkey::null()));
        tx
    }

    #[test]
    fn sighash_all_is_deterministic_and_sensitive_to_script_code() {
        let tx = one_in_one_out(0xffff_ffff);
        let script_a = Script::new(vec![0x76, 0xa9]);
        let script_b = Script::new(vec![0x76, 0xa8]);

        let digest_a = legacy_sighash(&tx, 0, &script_a, SighashBase::All as u32, None).unwrap();
        let digest_a_again = legacy_sighash(&tx, 0, &script_a, SighashBase::All as u32, None).unwrap();
        let digest_b = legacy_sighash(&tx, 0, &script_b, SighashBase::All as u32, None).unwrap();

        assert_eq!(digest_a.as_ref(), digest_a_again.as_ref());
        assert_ne!(digest_a.as_ref(), digest_b.as_ref());
    }

    #[test]
    fn sighash_single_bug_returns_the_constant_digest() {
        let tx = one_in_one_out(0xffff_ffff);
        let script = Script::new(vec![0x76, 0xa9]);

        // Only one output (index 0) but we sign input index 0 requesting SINGLE — index 0 is
        // in range here, so construct a case where it is not: sign index 0 of a tx with zero
        // outputs by removing the output after construction.
        let mut tx_no_outputs = tx.clone();
        tx_no_outputs.remove_output(0).unwrap();

        let digest =
            legacy_sighash(&tx_no_outputs, 0, &script, SighashBase::Single as u32, None).unwrap();
        assert_eq!(digest.as_ref(), &SIGHASH_SINGLE_BUG_DIGEST);
    }

    #[test]
    fn sighash_single_bug_digest_is_the_documented_constant() {
        assert_eq!(hex::encode(SIGHASH_SINGLE_BUG_DIGEST), {
            let mut s = "01".to_string();
            s.push_str(&"00".repeat(31));
            s
        });
    }

    #[test]
    fn unknown_sighash_base_normalizes_to_all() {
        let unknown = SighashFlag::from_u32(0x1f);
        assert_eq!(unknown.base, SighashBase::All);
    }

    #[test]
    fn forkid_bit_is_carried_verbatim_into_the_raw_word() {
        let flag = SighashFlag::from_u32(SighashBase::All as u32 | FORKID);
        assert_eq!(flag.base, SighashBase::All);
        assert_eq!(flag.raw, SighashBase::All as u32 | FORKID);
    }

    #[test]
    fn anyonecanpay_zeroes_hash_prevouts_and_hash_sequence() {
        let mut tx = one_in_one_out(0xffff_ffff);
        tx.add_input(TxIn::new(Outpoint::new(TXID::default(), 1)));

        let flag = SighashFlag::from_u32(SighashBase::All as u32 | ANYONECANPAY);
        assert_eq!(
            hash_prevouts(&tx, flag).unwrap().as_ref(),
            Hash256Digest::default().as_ref()
        );
        assert_eq!(
            hash_sequence(&tx, flag).unwrap().as_ref(),
            Hash256Digest::default().as_ref()
        );
    }

    #[test]
    fn extra_hook_changes_the_digest_and_is_order_sensitive() {
        let tx = one_in_one_out(0xffff_ffff);
        let script = Script::new(vec![0x76, 0xa9]);

        let plain = legacy_sighash(&tx, 0, &script, SighashBase::All as u32, None).unwrap();
        let with_extra = legacy_sighash(
            &tx,
            0,
            &script,
            SighashBase::All as u32,
            Some(Extra {
                bytes: &[0xde, 0xad, 0xbe, 0xef],
                offset: u32::MAX,
            }),
        )
        .unwrap();
        let with_extra_at_zero = legacy_sighash(
            &tx,
            0,
            &script,
            SighashBase::All as u32,
            Some(Extra {
                bytes: &[0xde, 0xad, 0xbe, 0xef],
                offset: 0,
            }),
        )
        .unwrap();

        assert_ne!(plain.as_ref(), with_extra.as_ref());
        assert_ne!(with_extra.as_ref(), with_extra_at_zero.as_ref());
    }

    #[test]
    fn bip143_sighash_differs_from_legacy_for_the_same_inputs() {
        let tx = one_in_one_out(0xffff_ffff);
        let script = Script::new(vec![0x76, 0xa9]);

        let legacy = legacy_sighash(&tx, 0, &script, SighashBase::All as u32, None).unwrap();
        let witness =
            bip143_sighash(&tx, 0, &script, 100_000, SighashBase::All as u32, None).unwrap();

        assert_ne!(legacy.as_ref(), witness.as_ref());
    }

    #[test]
    fn bip143_hash_outputs_is_zero_digest_when_single_index_out_of_range() {
        let mut tx = one_in_one_out(0xffff_ffff);
        tx.remove_output(0).unwrap();

        let digest = bip143_sighash(&tx, 0, &Script::null(), 0, SighashBase::Single as u32, None)
            .unwrap();
        // Does not error and does not reproduce the legacy "bug" constant: BIP-143 simply
        // zeroes hash_outputs in this case.
        assert_ne!(digest.as_ref(), &SIGHASH_SINGLE_BUG_DIGEST);
    }

    #[test]
    fn legacy_sighash_all_matches_an_independently_computed_digest() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::new(TXID::default(), 0)));
        tx.add_output(TxOut::new(1_000, ScriptPubkey::new(vec![0x51])));

        let mut prevout_script_bytes = vec![0x76, 0xa9, 0x14];
        prevout_script_bytes.extend_from_slice(&[0u8; 20]);
        prevout_script_bytes.extend_from_slice(&[0x88, 0xac]);
        let prevout_script = Script::new(prevout_script_bytes);

        let digest = legacy_sighash(&tx, 0, &prevout_script, SighashBase::All as u32, None).unwrap();

        // Computed independently over the same preimage layout, not derived from this module.
        assert_eq!(
            hex::encode(digest.as_ref()),
            "08a33aa50ec32814bdc4477e26a1c5798d511d2a61d11a50e59597382d6fb25e"
        );
    }

    #[test]
    fn bip143_sighash_matches_an_independently_computed_digest() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::new(TXID::default(), 0)));
        tx.add_output(TxOut::new(1_000, ScriptPubkey::new(vec![0x51])));

        let mut script_code_bytes = vec![0x76, 0xa9, 0x14];
        script_code_bytes.extend_from_slice(&[0u8; 20]);
        script_code_bytes.extend_from_slice(&[0x88, 0xac]);
        let script_code = Script::new(script_code_bytes);

        let digest =
            bip143_sighash(&tx, 0, &script_code, 100_000, SighashBase::All as u32, None).unwrap();

        assert_eq!(
            hex::encode(digest.as_ref()),
            "5aaef35ea3a81365ccb05dd0262f25564f682c5e549b2f1985c3926de2611f54"
        );
    }
}
