//! A Bitcoin transaction data model, wire codec, weight/vsize accounting, and signature-hash
//! (sighash) preimage construction, covering both legacy and BIP-141/BIP-143 SegWit transactions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod hashes;
pub mod sighash;
pub mod types;

pub use hashes::{TXID, WTXID};
pub use sighash::{
    bip143_sighash, legacy_sighash, Extra, SighashBase, SighashFlag, ANYONECANPAY, FORKID,
    SIGHASH_SINGLE_BUG_DIGEST,
};
pub use types::{
    dummy_der_signature, dummy_witness_item, vsize_from_weight, DummyWitnessKind, EncodeFlags,
    Outpoint, Script, ScriptPubkey, ScriptSig, Transaction, TxIn, TxOut, Witness,
    WitnessStackItem,
};

/// Errors produced while constructing, (de)serializing, or computing a signature hash for a
/// transaction.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// Propagated from the lower-level varint/varbuff codec.
    #[error(transparent)]
    SerError(#[from] txcore::SerError),

    /// Propagated from the underlying reader/writer.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// A caller-supplied argument was out of range (e.g. a mutator index past the end of the
    /// relevant vector, or a version this core does not support constructing).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The decoded SegWit marker/flag bytes were present but did not equal `0x00, 0x01`.
    #[error("bad SegWit marker/flag bytes: {0:?}")]
    BadWitnessFlag([u8; 2]),

    /// A length-prefixed field declared more bytes than remained in the input.
    #[error("malformed transaction: {0}")]
    Malformed(String),
}
