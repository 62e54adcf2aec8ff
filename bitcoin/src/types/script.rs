//! Script and witness-item byte buffers.
//!
//! This core treats scripts and witness items as opaque, length-prefixed byte buffers: it does
//! not parse opcodes, classify standard script templates, or derive addresses from them. That
//! interpretation belongs to a higher layer.

use txcore::{impl_script_conversion, wrap_prefixed_byte_vector};

wrap_prefixed_byte_vector!(Script);
wrap_prefixed_byte_vector!(ScriptSig);
wrap_prefixed_byte_vector!(ScriptPubkey);
wrap_prefixed_byte_vector!(WitnessStackItem);

impl_script_conversion!(Script, ScriptSig);
impl_script_conversion!(Script, ScriptPubkey);
impl_script_conversion!(Script, WitnessStackItem);

/// A single input's witness stack: an ordered sequence of witness items.
pub type Witness = Vec<WitnessStackItem>;

#[cfg(test)]
mod tests {
    use super::*;
    use txcore::ser::ByteFormat;

    #[test]
    fn it_round_trips_scripts_through_hex() {
        let cases = [
            "160014758ce550380d964051086798d6546bebdca27a73",
            "00",
        ];
        for case in cases.iter() {
            let script = Script::deserialize_hex(case).unwrap();
            assert_eq!(script.serialize_hex().unwrap(), case.to_string());
        }
    }

    #[test]
    fn empty_and_null_witness_items_encode_identically() {
        assert_eq!(WitnessStackItem::null().serialize_hex().unwrap(), "00");
        assert_eq!(
            WitnessStackItem::new(vec![]).serialize_hex().unwrap(),
            "00"
        );
    }

    #[test]
    fn script_types_convert_between_each_other() {
        let script = Script::new(vec![0x51]);
        let sig: ScriptSig = (&script).into();
        let back: Script = (&sig).into();
        assert_eq!(script, back);
    }
}
