//! The Bitcoin transaction data model.

pub mod script;
pub mod transaction;
pub mod txin;
pub mod txout;

pub use script::{Script, ScriptPubkey, ScriptSig, Witness, WitnessStackItem};
pub use transaction::{
    dummy_der_signature, dummy_witness_item, vsize_from_weight, DummyWitnessKind, EncodeFlags,
    Transaction,
};
pub use txin::{Outpoint, TxIn, SEQUENCE_FINAL};
pub use txout::TxOut;

txcore::impl_hex_serde!(TxOut);
txcore::impl_hex_serde!(Outpoint);
txcore::impl_hex_serde!(TxIn);
txcore::impl_hex_serde!(Transaction);
