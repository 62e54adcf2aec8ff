//! Transaction outputs.

use std::io::{Read, Write};

use txcore::ser::ByteFormat;

use crate::types::script::ScriptPubkey;

/// A transaction output: an amount, in satoshis, and the script that locks it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxOut {
    /// The value of the output, in satoshis.
    pub value: u64,
    /// The script locking this output.
    pub script_pubkey: ScriptPubkey,
}

impl TxOut {
    /// Constructs a new output.
    pub fn new<T: Into<ScriptPubkey>>(value: u64, script_pubkey: T) -> Self {
        Self {
            value,
            script_pubkey: script_pubkey.into(),
        }
    }

    /// Constructs the "null" output used to fill in truncated positions ahead of the signed index
    /// in a legacy `SIGHASH_SINGLE` preimage: max-value satoshis, empty script.
    pub fn null() -> Self {
        Self {
            value: 0xffff_ffff_ffff_ffff,
            script_pubkey: ScriptPubkey::null(),
        }
    }
}

impl Default for TxOut {
    fn default() -> Self {
        Self::null()
    }
}

impl ByteFormat for TxOut {
    type Error = crate::TxError;

    fn encoded_len(&self) -> usize {
        8 + self.script_pubkey.encoded_len()
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let value = Self::read_u64_le(reader)?;
        let script_pubkey = ScriptPubkey::read_from(reader)?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut len = Self::write_u64_le(writer, self.value)?;
        len += self.script_pubkey.write_to(writer)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_serializes_and_deserializes_outputs() {
        let cases = [
            (TxOut::new(0, ScriptPubkey::null()), "000000000000000000", 9),
            (TxOut::null(), "ffffffffffffffff00", 9),
        ];
        for (txout, hex, len) in cases.iter() {
            assert_eq!(txout.encoded_len(), *len);
            assert_eq!(&txout.serialize_hex().unwrap(), hex);
            assert_eq!(&TxOut::deserialize_hex(hex).unwrap(), txout);
        }
    }
}
