//! Transaction inputs and their previous-output references.

use std::io::{Read, Write};

use txcore::ser::ByteFormat;

use crate::{
    hashes::TXID,
    types::script::{ScriptSig, Witness},
};

/// A reference to a previous transaction's output: a txid and the index of the output being
/// spent within that transaction.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Outpoint {
    /// The previous transaction's txid.
    pub txid: TXID,
    /// The index of the output being spent, within the previous transaction.
    pub idx: u32,
}

impl Outpoint {
    /// Constructs a new outpoint.
    pub fn new(txid: TXID, idx: u32) -> Self {
        Self { txid, idx }
    }

    /// Constructs the null outpoint (used as a coinbase input's previous output).
    pub fn null() -> Self {
        Self {
            txid: TXID::default(),
            idx: 0xffff_ffff,
        }
    }

    /// Returns the previous txid as a big-endian hex string, matching the order block explorers
    /// print txids in.
    pub fn txid_be_hex(&self) -> String {
        self.txid.to_be_hex()
    }
}

impl ByteFormat for Outpoint {
    type Error = crate::TxError;

    fn encoded_len(&self) -> usize {
        36
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let txid = TXID::read_from(reader)?;
        let idx = Self::read_u32_le(reader)?;
        Ok(Self { txid, idx })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut len = self.txid.write_to(writer)?;
        len += Self::write_u32_le(writer, self.idx)?;
        Ok(len)
    }
}

/// A transaction input: a reference to the output it spends, the unlocking script (or, for a
/// SegWit input, an empty script and a witness stack), and a sequence number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxIn {
    /// The previous output this input spends.
    pub outpoint: Outpoint,
    /// The unlocking script. Empty for a pure-SegWit input.
    pub script_sig: ScriptSig,
    /// The sequence number. `0xffff_ffff` marks the input as final (not subject to relative
    /// locktime / opt-in RBF signaling).
    pub sequence: u32,
    /// The input's witness stack, if any. `None` and `Some(vec![])` are equivalent for encoding
    /// purposes (see `Transaction::is_witness_bearing`), but a transaction decoded from SegWit
    /// wire bytes always carries `Some(..)`, even if empty.
    pub witness: Option<Witness>,
}

/// The sequence number marking an input as final.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

impl TxIn {
    /// Constructs a new, unsigned input (empty scriptSig, no witness, final sequence).
    pub fn new(outpoint: Outpoint) -> Self {
        Self {
            outpoint,
            script_sig: ScriptSig::null(),
            sequence: SEQUENCE_FINAL,
            witness: None,
        }
    }

    /// Replaces this input's unlocking script.
    pub fn set_script_sig(&mut self, script_sig: ScriptSig) {
        self.script_sig = script_sig;
    }

    /// Replaces this input's witness stack.
    pub fn set_witness(&mut self, witness: Witness) {
        self.witness = Some(witness);
    }

    /// Returns true if this input carries a non-empty witness stack.
    pub fn is_witness_bearing(&self) -> bool {
        matches!(&self.witness, Some(w) if !w.is_empty())
    }
}

impl ByteFormat for TxIn {
    type Error = crate::TxError;

    fn encoded_len(&self) -> usize {
        self.outpoint.encoded_len() + self.script_sig.encoded_len() + 4
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let outpoint = Outpoint::read_from(reader)?;
        let script_sig = ScriptSig::read_from(reader)?;
        let sequence = Self::read_u32_le(reader)?;
        Ok(Self {
            outpoint,
            script_sig,
            sequence,
            witness: None,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut len = self.outpoint.write_to(writer)?;
        len += self.script_sig.write_to(writer)?;
        len += Self::write_u32_le(writer, self.sequence)?;
        Ok(len)
    }
}
