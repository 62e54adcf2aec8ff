//! Marker traits distinguishing digests that happen to share a byte representation (a txid and a
//! wtxid are both 32 bytes, but are never interchangeable).

use std::io::Write;

use crate::ser::ByteFormat;

/// A bare cryptographic digest. Implemented by the concrete digest types (e.g. a double-SHA-256
/// output) that a `MarkedDigest` wraps.
pub trait Digest: Default + ByteFormat + Copy {}

/// A digest that has been marked with the role it plays (txid vs wtxid), so that the type system
/// rejects using one where the other is expected.
pub trait MarkedDigest: Default + ByteFormat + Copy {
    /// The underlying unmarked digest type.
    type Digest: Digest;

    /// Wraps a bare digest with this marker.
    fn new(hash: Self::Digest) -> Self;

    /// Returns the unmarked digest.
    fn internal(&self) -> Self::Digest;

    /// Returns the digest bytes in internal (little-endian, as transmitted on the wire) order.
    fn bytes(&self) -> Vec<u8>;

    /// Returns this digest with its bytes reversed, i.e. in the big-endian order Bitcoin block
    /// explorers and RPC interfaces conventionally print txids in.
    fn reversed(&self) -> Self {
        let mut bytes = self.bytes();
        bytes.reverse();
        let mut cursor = std::io::Cursor::new(bytes.as_slice());
        Self::read_from(&mut cursor).expect("reversing a valid digest cannot fail to re-parse")
    }
}

/// A hasher that accumulates bytes via `Write` and yields a marked digest when finished.
pub trait MarkedDigestWriter<T: Digest>: Default + Write {
    /// Consumes the writer, returning the accumulated digest.
    fn finish(self) -> T;

    /// Consumes the writer, returning the accumulated digest wrapped with a marker type.
    fn finish_marked<M: MarkedDigest<Digest = T>>(self) -> M
    where
        Self: Sized,
    {
        MarkedDigest::new(self.finish())
    }
}
