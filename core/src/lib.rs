//! Serialization traits and marked-digest primitives shared by the chain-specific transaction
//! crates in this workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod hashes;
#[macro_use]
pub mod macros;
pub mod ser;

pub use hashes::{Digest, MarkedDigest, MarkedDigestWriter};
pub use ser::{ByteFormat, SerError, SerResult};
