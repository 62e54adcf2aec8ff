//! Digest primitives shared by every chain-specific crate in the workspace.

pub mod hash256;
pub mod marked;

pub use hash256::{dsha256, Hash256Digest, Hash256Writer};
pub use marked::{Digest, MarkedDigest, MarkedDigestWriter};
