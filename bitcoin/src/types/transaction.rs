//! The `Transaction` container, its wire codec (legacy and BIP-141 SegWit forms), and BIP-141
//! weight/vsize accounting.

use std::io::{Cursor, Read, Write};

use txcore::ser::ByteFormat;

use crate::{
    types::{
        script::{ScriptSig, Witness},
        txin::{Outpoint, TxIn},
        txout::TxOut,
    },
    TxError,
};

/// The version this core constructs new transactions with. The wire parser accepts and
/// round-trips any 32-bit version; only `Transaction::new` is restricted, pending a
/// specification update covering version-1 construction (see DESIGN.md).
pub const VERSION: u32 = 2;

/// Flags controlling how a transaction is encoded or measured.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EncodeFlags(u8);

impl EncodeFlags {
    /// No flags: always produce the legacy (pre-SegWit) wire form.
    pub const NONE: EncodeFlags = EncodeFlags(0);

    /// Emit the BIP-141 marker/flag and per-input witness stacks, if the transaction is
    /// witness-bearing. Has no effect on a transaction with no non-empty witnesses.
    pub const USE_WITNESS: EncodeFlags = EncodeFlags(0x1);

    /// Returns true if `USE_WITNESS` is set.
    pub fn use_witness(self) -> bool {
        self.0 & Self::USE_WITNESS.0 != 0
    }
}

/// A filler standing in for a not-yet-produced signature or witness item, used to estimate the
/// weight of a transaction before it is fully signed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DummyWitnessKind {
    /// An empty witness item, standing in for a multisig placeholder (`OP_0` in the witness
    /// stack) or any other witness element that is known in advance to be absent.
    Null = 0x1,
    /// A maximum-length DER-encoded ECDSA signature filler.
    Sig = 0x2,
}

/// Returns the filler witness item standing in for `kind`, for use in pre-signing weight
/// estimation: an empty item for `Null`, a maximum-length DER signature for `Sig`.
pub fn dummy_witness_item(kind: DummyWitnessKind) -> Vec<u8> {
    match kind {
        DummyWitnessKind::Null => Vec::new(),
        DummyWitnessKind::Sig => dummy_der_signature(),
    }
}

/// Returns a 72-byte filler standing in for a maximum-length DER-encoded ECDSA signature, for use
/// in pre-signing weight estimation.
pub fn dummy_der_signature() -> Vec<u8> {
    vec![0u8; 72]
}

/// A Bitcoin transaction: a version, an ordered list of inputs, an ordered list of outputs, and a
/// locktime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    version: u32,
    vin: Vec<TxIn>,
    vout: Vec<TxOut>,
    locktime: u32,
}

impl Transaction {
    /// Constructs a new, empty transaction at the current construction version.
    pub fn new(locktime: u32) -> Self {
        Self {
            version: VERSION,
            vin: vec![],
            vout: vec![],
            locktime,
        }
    }

    /// Returns the transaction's version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the transaction's locktime.
    pub fn locktime(&self) -> u32 {
        self.locktime
    }

    /// Sets the transaction's locktime.
    pub fn set_locktime(&mut self, locktime: u32) {
        self.locktime = locktime;
    }

    /// Returns the transaction's inputs.
    pub fn inputs(&self) -> &[TxIn] {
        &self.vin
    }

    /// Returns the transaction's outputs.
    pub fn outputs(&self) -> &[TxOut] {
        &self.vout
    }

    /// Appends an input.
    pub fn add_input(&mut self, input: TxIn) {
        self.vin.push(input);
    }

    /// Replaces the entire input list in place. Used by sighash preimage construction, which
    /// builds a modified scratch copy of the transaction (see `sighash::legacy_sighash`).
    pub(crate) fn set_inputs(&mut self, vin: Vec<TxIn>) {
        self.vin = vin;
    }

    /// Replaces the entire output list in place. Used by sighash preimage construction.
    pub(crate) fn set_outputs(&mut self, vout: Vec<TxOut>) {
        self.vout = vout;
    }

    /// Inserts an input at `index`, shifting later inputs back. Errors if `index` is out of
    /// bounds.
    pub fn insert_input(&mut self, index: usize, input: TxIn) -> Result<(), TxError> {
        if index > self.vin.len() {
            return Err(TxError::InvalidArgument(format!(
                "input index {} out of bounds (len {})",
                index,
                self.vin.len()
            )));
        }
        self.vin.insert(index, input);
        Ok(())
    }

    /// Removes and returns the input at `index`. Errors if `index` is out of bounds.
    pub fn remove_input(&mut self, index: usize) -> Result<TxIn, TxError> {
        if index >= self.vin.len() {
            return Err(TxError::InvalidArgument(format!(
                "input index {} out of bounds (len {})",
                index,
                self.vin.len()
            )));
        }
        Ok(self.vin.remove(index))
    }

    /// Appends an output.
    pub fn add_output(&mut self, output: TxOut) {
        self.vout.push(output);
    }

    /// Inserts an output at `index`, shifting later outputs back. Errors if `index` is out of
    /// bounds.
    pub fn insert_output(&mut self, index: usize, output: TxOut) -> Result<(), TxError> {
        if index > self.vout.len() {
            return Err(TxError::InvalidArgument(format!(
                "output index {} out of bounds (len {})",
                index,
                self.vout.len()
            )));
        }
        self.vout.insert(index, output);
        Ok(())
    }

    /// Removes and returns the output at `index`. Errors if `index` is out of bounds.
    pub fn remove_output(&mut self, index: usize) -> Result<TxOut, TxError> {
        if index >= self.vout.len() {
            return Err(TxError::InvalidArgument(format!(
                "output index {} out of bounds (len {})",
                index,
                self.vout.len()
            )));
        }
        Ok(self.vout.remove(index))
    }

    /// Replaces the scriptSig of the input at `index`. Errors if `index` is out of bounds.
    pub fn set_input_script_sig(&mut self, index: usize, script_sig: ScriptSig) -> Result<(), TxError> {
        let input = self
            .vin
            .get_mut(index)
            .ok_or_else(|| TxError::InvalidArgument(format!("input index {} out of bounds", index)))?;
        input.set_script_sig(script_sig);
        Ok(())
    }

    /// Replaces the witness stack of the input at `index`. Errors if `index` is out of bounds.
    pub fn set_input_witness(&mut self, index: usize, witness: Witness) -> Result<(), TxError> {
        let input = self
            .vin
            .get_mut(index)
            .ok_or_else(|| TxError::InvalidArgument(format!("input index {} out of bounds", index)))?;
        input.set_witness(witness);
        Ok(())
    }

    /// Returns true if at least one input carries a non-empty witness stack.
    pub fn is_witness_bearing(&self) -> bool {
        self.vin.iter().any(TxIn::is_witness_bearing)
    }

    /// Returns the number of inputs that carry a witness stack with at least one item, whether or
    /// not any item is itself non-empty. Distinguishing this from `is_witness_bearing` matters
    /// after a SegWit round trip, where every input decodes with `Some(..)`, possibly empty.
    pub fn witness_count(&self) -> usize {
        self.vin
            .iter()
            .filter(|i| matches!(&i.witness, Some(w) if !w.is_empty()))
            .count()
    }

    fn encoded_len_with_flags(&self, flags: EncodeFlags) -> usize {
        let witness = flags.use_witness() && self.is_witness_bearing();
        let mut len = 4; // version
        if witness {
            len += 2; // marker, flag
        }
        len += txcore::ser::prefix_byte_len(self.vin.len() as u64) as usize;
        len += self.vin.iter().map(TxIn::encoded_len).sum::<usize>();
        len += txcore::ser::prefix_byte_len(self.vout.len() as u64) as usize;
        len += self.vout.iter().map(TxOut::encoded_len).sum::<usize>();
        if witness {
            for input in &self.vin {
                let stack = input.witness.as_ref();
                len += txcore::ser::prefix_byte_len(stack.map_or(0, |w| w.len() as u64)) as usize;
                if let Some(stack) = stack {
                    len += stack.iter().map(ByteFormat::encoded_len).sum::<usize>();
                }
            }
        }
        len += 4; // locktime
        len
    }

    /// Returns the encoded length of this transaction under `flags`.
    pub fn encoded_len_with(&self, flags: EncodeFlags) -> usize {
        self.encoded_len_with_flags(flags)
    }

    fn write_to_with_flags<W: Write>(&self, writer: &mut W, flags: EncodeFlags) -> Result<usize, TxError> {
        let witness = flags.use_witness() && self.is_witness_bearing();
        let mut len = TxIn::write_u32_le(writer, self.version)?;
        if witness {
            len += writer.write(&[0x00, 0x01])?;
        }
        len += txcore::ser::write_compact_int(writer, self.vin.len() as u64)?;
        for input in &self.vin {
            len += input.write_to(writer)?;
        }
        len += txcore::ser::write_compact_int(writer, self.vout.len() as u64)?;
        for output in &self.vout {
            len += output.write_to(writer)?;
        }
        if witness {
            for input in &self.vin {
                let empty = vec![];
                let stack = input.witness.as_ref().unwrap_or(&empty);
                len += stack.write_to(writer)?;
            }
        }
        len += TxIn::write_u32_le(writer, self.locktime)?;
        Ok(len)
    }

    /// Writes this transaction to `writer` under `flags`, returning the number of bytes written.
    pub fn write_to_with(&self, writer: &mut (impl Write), flags: EncodeFlags) -> Result<usize, TxError> {
        self.write_to_with_flags(writer, flags)
    }

    /// Serializes this transaction to owned bytes under `flags`.
    pub fn to_bytes_with(&self, flags: EncodeFlags) -> Result<Vec<u8>, TxError> {
        let mut buf = Vec::with_capacity(self.encoded_len_with(flags));
        self.write_to_with(&mut buf, flags)?;
        Ok(buf)
    }

    /// Deserializes a transaction from `bytes`. SegWit-ness is auto-detected via lookahead; the
    /// `flags` parameter is accepted for symmetry with the encoder but has no effect on decoding.
    /// Bytes left over after a complete transaction is parsed are rejected rather than silently
    /// discarded.
    pub fn from_bytes_with(bytes: &[u8], _flags: EncodeFlags) -> Result<Self, TxError> {
        let mut cursor = Cursor::new(bytes);
        let tx = Self::read_from(&mut cursor)?;
        if cursor.position() != bytes.len() as u64 {
            return Err(TxError::Malformed(format!(
                "{} trailing byte(s) after transaction",
                bytes.len() as u64 - cursor.position()
            )));
        }
        Ok(tx)
    }

    /// Returns the BIP-141 weight of this transaction: `3 * base_size + total_size`.
    pub fn weight(&self) -> u64 {
        let base = self.encoded_len_with(EncodeFlags::NONE) as u64;
        let total = self.encoded_len_with(EncodeFlags::USE_WITNESS) as u64;
        base * 3 + total
    }

    /// Returns the BIP-141 virtual size of this transaction: `ceil(weight / 4)`.
    pub fn vsize(&self) -> u64 {
        vsize_from_weight(self.weight())
    }

    /// Serializes this transaction to bytes, including the SegWit marker/flag and witnesses if
    /// it is witness-bearing. Equivalent to `to_bytes_with(EncodeFlags::USE_WITNESS)`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.to_bytes_with(EncodeFlags::USE_WITNESS)
    }

    /// Deserializes a transaction from bytes, auto-detecting the SegWit marker/flag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        Self::from_bytes_with(bytes, EncodeFlags::USE_WITNESS)
    }

    /// Serializes this transaction to a hex string, including the SegWit marker/flag and
    /// witnesses if it is witness-bearing.
    pub fn to_hex(&self) -> Result<String, TxError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Deserializes a transaction from a hex string, auto-detecting the SegWit marker/flag.
    pub fn from_hex(s: &str) -> Result<Self, TxError> {
        let bytes = hex::decode(s).map_err(txcore::SerError::from)?;
        Self::from_bytes(&bytes)
    }
}

/// Returns the virtual size corresponding to a given weight: `ceil(weight / 4)`.
pub fn vsize_from_weight(weight: u64) -> u64 {
    (weight + 3) / 4
}

impl ByteFormat for Transaction {
    type Error = TxError;

    fn encoded_len(&self) -> usize {
        self.encoded_len_with(EncodeFlags::USE_WITNESS)
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let version = Self::read_u32_le(reader)?;

        // A legacy input-count varint of 0 is indistinguishable, at the byte level, from the
        // BIP-141 marker. Rather than speculatively peeking and seeking back, this follows the
        // same resolution the reference client uses: decode the input list as normal; if it
        // comes back empty, the single byte already consumed as "no inputs" might instead have
        // been the marker, so read one more byte and decide from it.
        let mut vin: Vec<TxIn> = Vec::<TxIn>::read_from(reader)?;
        let mut is_witness = false;
        let vout: Vec<TxOut>;

        if vin.is_empty() {
            let mut flag = [0u8; 1];
            reader.read_exact(&mut flag).map_err(TxError::from)?;
            match flag[0] {
                0x00 => {
                    // Genuinely zero inputs: the byte just read was the (zero) output count, and
                    // there is nothing further to read for outputs.
                    vout = vec![];
                }
                0x01 => {
                    is_witness = true;
                    vin = Vec::<TxIn>::read_from(reader)?;
                    vout = Vec::<TxOut>::read_from(reader)?;
                }
                _ => return Err(TxError::BadWitnessFlag([0x00, flag[0]])),
            }
        } else {
            vout = Vec::<TxOut>::read_from(reader)?;
        }

        if is_witness {
            for input in vin.iter_mut() {
                let stack = Vec::<crate::types::script::WitnessStackItem>::read_from(reader)?;
                input.witness = Some(stack);
            }
        }

        let locktime = Self::read_u32_le(reader)?;

        Ok(Self {
            version,
            vin,
            vout,
            locktime,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        self.write_to_with_flags(writer, EncodeFlags::USE_WITNESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashes::TXID;
    use crate::types::script::{ScriptPubkey, ScriptSig, WitnessStackItem};

    #[test]
    fn empty_v2_transaction_is_ten_bytes() {
        let tx = Transaction::new(0);
        let bytes = tx.to_bytes().unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(hex::encode(&bytes), "02000000000000000000");
        assert_eq!(Transaction::from_bytes(&bytes).unwrap(), tx);
    }

    #[test]
    fn single_input_single_output_legacy_round_trips() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::null()));
        tx.add_output(TxOut::new(50_000, ScriptPubkey::null()));

        let bytes = tx.to_bytes_with(EncodeFlags::NONE).unwrap();
        assert_eq!(bytes.len(), tx.encoded_len_with(EncodeFlags::NONE));
        assert_eq!(bytes[4], 0x01, "legacy form must not carry a marker byte here");

        let round_tripped = Transaction::from_bytes_with(&bytes, EncodeFlags::NONE).unwrap();
        assert_eq!(round_tripped.inputs().len(), 1);
        assert_eq!(round_tripped.outputs().len(), 1);
        assert_eq!(round_tripped.outputs()[0].value, 50_000);
        assert!(!round_tripped.is_witness_bearing());
    }

    #[test]
    fn segwit_round_trip_preserves_marker_and_witness_count() {
        let mut tx = Transaction::new(0);
        let mut input = TxIn::new(Outpoint::null());
        input.set_script_sig(ScriptSig::null());
        input.set_witness(vec![WitnessStackItem::new(vec![0xde, 0xad]), WitnessStackItem::null()]);
        tx.add_input(input);
        tx.add_output(TxOut::new(1_000, ScriptPubkey::null()));

        assert!(tx.is_witness_bearing());

        let bytes = tx.to_bytes_with(EncodeFlags::USE_WITNESS).unwrap();
        assert_eq!(bytes[4], 0x00);
        assert_eq!(bytes[5], 0x01);

        let round_tripped = Transaction::from_bytes_with(&bytes, EncodeFlags::USE_WITNESS).unwrap();
        assert_eq!(round_tripped.witness_count(), 1);
        assert_eq!(
            round_tripped.inputs()[0].witness.as_ref().unwrap().len(),
            2
        );
        assert!(round_tripped.is_witness_bearing());
    }

    #[test]
    fn non_witness_bearing_transaction_omits_marker_even_with_use_witness_flag() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::null()));
        tx.add_output(TxOut::new(1, ScriptPubkey::null()));

        let bytes = tx.to_bytes_with(EncodeFlags::USE_WITNESS).unwrap();
        assert_eq!(
            bytes,
            tx.to_bytes_with(EncodeFlags::NONE).unwrap(),
            "USE_WITNESS must have no effect when no input carries a witness"
        );
    }

    #[test]
    fn decoding_tolerates_a_non_canonical_varint_input_count() {
        // version || non-minimal 3-byte varint encoding "0" (0xfd 0x00 0x00) || empty vout ||
        // locktime. A strict encoder would never produce this, but a real-world parser must
        // still accept it.
        let mut bytes = vec![0x02, 0x00, 0x00, 0x00]; // version 2
        bytes.extend_from_slice(&[0xfd, 0x00, 0x00]); // non-minimal zero-length vin
        bytes.push(0x00); // empty vout
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // locktime

        let tx = Transaction::from_bytes_with(&bytes, EncodeFlags::NONE).unwrap();
        assert!(tx.inputs().is_empty());
    }

    #[test]
    fn decoding_rejects_trailing_garbage_after_a_complete_transaction() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::null()));
        tx.add_output(TxOut::new(50_000, ScriptPubkey::null()));

        let mut bytes = tx.to_bytes_with(EncodeFlags::NONE).unwrap();
        bytes.push(0xff);

        let err = Transaction::from_bytes_with(&bytes, EncodeFlags::NONE).unwrap_err();
        assert!(matches!(err, TxError::Malformed(_)));
    }

    #[test]
    fn weight_is_four_times_size_for_non_witness_bearing_transactions() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::null()));
        tx.add_output(TxOut::new(1, ScriptPubkey::null()));

        let size = tx.to_bytes_with(EncodeFlags::NONE).unwrap().len() as u64;
        assert_eq!(tx.weight(), size * 4);
        assert_eq!(tx.vsize(), size);
    }

    #[test]
    fn vsize_from_weight_rounds_up() {
        assert_eq!(vsize_from_weight(400), 100);
        assert_eq!(vsize_from_weight(401), 101);
        assert_eq!(vsize_from_weight(403), 101);
    }

    #[test]
    fn removing_an_input_shifts_later_inputs_and_rejects_out_of_range() {
        let mut tx = Transaction::new(0);
        tx.add_input(TxIn::new(Outpoint::new(TXID::default(), 0)));
        tx.add_input(TxIn::new(Outpoint::new(TXID::default(), 1)));

        let removed = tx.remove_input(0).unwrap();
        assert_eq!(removed.outpoint.idx, 0);
        assert_eq!(tx.inputs()[0].outpoint.idx, 1);

        assert!(tx.remove_input(5).is_err());
    }

    #[test]
    fn dummy_witness_item_is_empty_for_null_and_72_bytes_for_sig() {
        assert!(dummy_witness_item(DummyWitnessKind::Null).is_empty());
        assert_eq!(dummy_witness_item(DummyWitnessKind::Sig), dummy_der_signature());
        assert_eq!(dummy_witness_item(DummyWitnessKind::Sig).len(), 72);
    }
}
