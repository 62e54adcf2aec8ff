//! Double-SHA-256, the hash function Bitcoin uses for txids and signature-hash digests.

use sha2::{Digest as Sha2Digest, Sha256};
use std::io::{Read, Result as IOResult, Write};

use crate::{
    hashes::marked::{Digest, MarkedDigestWriter},
    ser::{ByteFormat, SerError},
};

/// A plain 32-byte double-SHA-256 digest, with no marker attached.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Hash256Digest([u8; 32]);

impl Digest for Hash256Digest {}

impl AsRef<[u8; 32]> for Hash256Digest {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsMut<[u8; 32]> for Hash256Digest {
    fn as_mut(&mut self) -> &mut [u8; 32] {
        &mut self.0
    }
}

impl From<[u8; 32]> for Hash256Digest {
    fn from(buf: [u8; 32]) -> Self {
        Self(buf)
    }
}

impl ByteFormat for Hash256Digest {
    type Error = SerError;

    fn encoded_len(&self) -> usize {
        32
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(Self(buf))
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        Ok(writer.write(&self.0)?)
    }
}

/// Returns the double-SHA-256 digest of `data` in a single call, with no intermediate writer.
pub fn dsha256(data: &[u8]) -> Hash256Digest {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first);
    let mut digest = Hash256Digest::default();
    digest.as_mut().copy_from_slice(&second[..]);
    digest
}

/// A `Write` sink that accumulates bytes and double-hashes them on `finish`. Used to compute a
/// txid/wtxid/sighash digest incrementally, without materializing the full preimage when the
/// caller already streams it through a writer.
#[derive(Default)]
pub struct Hash256Writer {
    internal: Sha256,
}

impl Write for Hash256Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.write(buf)
    }

    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash256Digest> for Hash256Writer {
    fn finish(self) -> Hash256Digest {
        let first = self.internal.finalize();
        let second = Sha256::digest(&first);
        let mut digest = Hash256Digest::default();
        digest.as_mut().copy_from_slice(&second[..]);
        digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_double_hashes_via_writer_in_chunks_same_as_all_at_once() {
        let data = b"a bitcoin transaction preimage";
        let mut whole = Hash256Writer::default();
        whole.write_all(data).unwrap();

        let mut chunked = Hash256Writer::default();
        chunked.write_all(&data[..10]).unwrap();
        chunked.write_all(&data[10..]).unwrap();
        chunked.flush().unwrap();

        assert_eq!(whole.finish().as_ref(), chunked.finish().as_ref());
    }

    #[test]
    fn encoded_len_and_round_trip_are_consistent() {
        let digest = dsha256(b"round trip me");
        assert_eq!(digest.encoded_len(), 32);
        let mut buf = vec![];
        digest.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 32);
        let mut cursor = std::io::Cursor::new(buf.as_slice());
        let read_back = Hash256Digest::read_from(&mut cursor).unwrap();
        assert_eq!(read_back.as_ref(), digest.as_ref());
    }

    #[test]
    fn dsha256_matches_incremental_writer() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut w = Hash256Writer::default();
        w.write_all(data).unwrap();
        assert_eq!(dsha256(data).as_ref(), w.finish().as_ref());
    }
}
