//! The `ByteFormat` trait and the Bitcoin-style variable-length integer codec that every wire
//! type in this workspace is built on.

use std::io::{Cursor, Read, Write};

/// Errors produced while reading or writing a `ByteFormat` type.
#[derive(Debug, thiserror::Error)]
pub enum SerError {
    /// Propagated from the underlying reader/writer.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Propagated from `hex::decode` while deserializing a hex string.
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    /// A length-prefixed buffer declared more bytes than remained in the input.
    #[error("varbuff declared length {declared} exceeds remaining input")]
    VarbuffOverrun {
        /// The declared length.
        declared: u64,
    },

    /// A component-level error with a descriptive message, used by callers that wrap `ser`
    /// failures in a more specific error without losing context.
    #[error("{0}")]
    ComponentError(String),
}

/// Result type returned by `ByteFormat` operations.
pub type SerResult<T> = Result<T, SerError>;

/// Returns the number of bytes a canonical Bitcoin varint encoding of `number` occupies,
/// including its prefix byte.
pub fn prefix_byte_len(number: u64) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Returns the one-byte varint prefix associated with a given encoded length (3, 5, or 9),
/// or `None` for the single-byte (no-prefix) form.
fn first_byte_from_len(len: u8) -> Option<u8> {
    match len {
        3 => Some(0xfd),
        5 => Some(0xfe),
        9 => Some(0xff),
        _ => None,
    }
}

/// Writes `number` as a canonical (shortest-form) Bitcoin varint, returning the number of bytes
/// written.
pub fn write_compact_int<W: Write>(writer: &mut W, number: u64) -> SerResult<usize> {
    let len = prefix_byte_len(number);
    match first_byte_from_len(len) {
        None => Ok(writer.write(&[number as u8])?),
        Some(prefix) => {
            let body = number.to_le_bytes();
            let mut written = writer.write(&[prefix])?;
            written += writer.write(&body[..len as usize - 1])?;
            Ok(written)
        }
    }
}

/// Reads a Bitcoin varint. Unlike the stricter `coins-core` ancestor of this codec, this reader
/// tolerates non-canonical (overlong) encodings on input: mainnet has observed them in the wild,
/// and a parser that rejects what the network accepts is not a faithful parser. Writers always
/// emit the canonical shortest form, so this asymmetry only ever widens what can be read.
pub fn read_compact_int<R: Read>(reader: &mut R) -> SerResult<u64> {
    let mut prefix = [0u8; 1];
    reader.read_exact(&mut prefix)?;
    let body_len = match prefix[0] {
        0xfd => 2,
        0xfe => 4,
        0xff => 8,
        _ => return Ok(prefix[0] as u64),
    };
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[..body_len])?;
    Ok(u64::from_le_bytes(buf))
}

/// A type that can be read from and written to a canonical byte stream.
///
/// This is the shared seam for every wire type in the workspace: instead of a sizing pass over a
/// null buffer followed by a second pass that actually writes, `encoded_len` is computed purely
/// by arithmetic and `read_from`/`write_to` drive ordinary `std::io::Read`/`Write`, propagating
/// failure with `?` rather than a sticky failure flag.
pub trait ByteFormat {
    /// The error type returned by this type's (de)serialization.
    type Error: std::error::Error + From<SerError> + From<std::io::Error>;

    /// Returns the number of bytes this value would occupy if serialized right now.
    fn encoded_len(&self) -> usize;

    /// Reads a value of this type from `reader`.
    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized;

    /// Writes this value to `writer`, returning the number of bytes written.
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error>;

    /// Reads a 4-byte little-endian `u32`.
    fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32, Self::Error> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).map_err(SerError::from)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads an 8-byte little-endian `u64`.
    fn read_u64_le<R: Read>(reader: &mut R) -> Result<u64, Self::Error> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(SerError::from)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes a 4-byte little-endian `u32`.
    fn write_u32_le<W: Write>(writer: &mut W, n: u32) -> Result<usize, Self::Error> {
        Ok(writer.write(&n.to_le_bytes()).map_err(SerError::from)?)
    }

    /// Writes an 8-byte little-endian `u64`.
    fn write_u64_le<W: Write>(writer: &mut W, n: u64) -> Result<usize, Self::Error> {
        Ok(writer.write(&n.to_le_bytes()).map_err(SerError::from)?)
    }

    /// Reads a varint-prefixed byte buffer ("varbuff").
    ///
    /// The declared length is untrusted wire input, so this never allocates it up front: bytes
    /// are pulled through a length-capped adapter and only as many as are actually available are
    /// ever copied. A declared length longer than what the reader actually has left is rejected
    /// as `SerError::VarbuffOverrun` rather than attempting the full-size allocation.
    fn read_varbuff<R: Read>(reader: &mut R) -> Result<Vec<u8>, Self::Error> {
        let len = read_compact_int(reader).map_err(Self::Error::from)?;
        let mut buf = Vec::new();
        let read = reader.take(len).read_to_end(&mut buf).map_err(SerError::from)?;
        if (read as u64) < len {
            return Err(Self::Error::from(SerError::VarbuffOverrun { declared: len }));
        }
        Ok(buf)
    }

    /// Writes a byte slice as a varint-prefixed buffer ("varbuff").
    fn write_varbuff<W: Write>(writer: &mut W, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut written = write_compact_int(writer, buf.len() as u64).map_err(Self::Error::from)?;
        written += writer.write(buf).map_err(SerError::from)?;
        Ok(written)
    }

    /// Deserializes a value from a hex string.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let bytes = hex::decode(s).map_err(SerError::from).map_err(Self::Error::from)?;
        let mut cursor = Cursor::new(bytes.as_slice());
        Self::read_from(&mut cursor)
    }

    /// Serializes this value to a hex string.
    fn serialize_hex(&self) -> Result<String, Self::Error> {
        let mut buf = vec![];
        self.write_to(&mut buf)?;
        Ok(hex::encode(buf))
    }
}

/// A declared item count this large is never preallocated up front, regardless of what a
/// length-prefixed vector's count varint claims: a crafted count near `u64::MAX` would otherwise
/// abort the process on the allocation before a single item is read. Legitimate transactions come
/// nowhere near this many inputs, outputs, or witness items; the vector still grows past this via
/// ordinary amortized `push`, it just never trusts the wire to size that growth.
const MAX_PREALLOCATED_ITEMS: u64 = 4096;

impl<I: ByteFormat> ByteFormat for Vec<I> {
    type Error = I::Error;

    fn encoded_len(&self) -> usize {
        let items_len: usize = self.iter().map(ByteFormat::encoded_len).sum();
        prefix_byte_len(self.len() as u64) as usize + items_len
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let count = read_compact_int(reader).map_err(Self::Error::from)?;
        let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATED_ITEMS) as usize);
        for _ in 0..count {
            items.push(I::read_from(reader)?);
        }
        Ok(items)
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut written = write_compact_int(writer, self.len() as u64).map_err(Self::Error::from)?;
        for item in self {
            written += item.write_to(writer)?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_matches_byte_len_and_prefix() {
        let cases = [
            (1u64, 1u8, None),
            (0xff, 3, Some(0xfd)),
            (0xffff_ffff, 5, Some(0xfe)),
            (0xffff_ffff_ffff_ffff, 9, Some(0xff)),
        ];
        for case in cases.iter() {
            assert_eq!(prefix_byte_len(case.0), case.1);
            assert_eq!(first_byte_from_len(case.1), case.2);
        }
    }

    #[test]
    fn it_round_trips_compact_ints() {
        let cases = [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, u64::MAX];
        for &n in cases.iter() {
            let mut buf = vec![];
            write_compact_int(&mut buf, n).unwrap();
            assert_eq!(buf.len(), prefix_byte_len(n) as usize);
            let mut cursor = Cursor::new(buf.as_slice());
            assert_eq!(read_compact_int(&mut cursor).unwrap(), n);
        }
    }

    #[test]
    fn it_tolerates_non_minimal_compact_ints_on_read() {
        // 0xfd prefix followed by a 2-byte value that would fit in 1 byte.
        let non_minimal = [0xfdu8, 0x05, 0x00];
        let mut cursor = Cursor::new(&non_minimal[..]);
        assert_eq!(read_compact_int(&mut cursor).unwrap(), 5);
    }
}
