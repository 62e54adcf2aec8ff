//! Codegen macros for the newtype wrappers used throughout the wire types: length-prefixed byte
//! buffers (scripts, witness items) and marked 32-byte digests (txid, wtxid).

/// Implements `serde::Serialize`/`Deserialize` for a `ByteFormat` type by passing through its hex
/// representation.
#[macro_export]
macro_rules! impl_hex_serde {
    ($item:ty) => {
        impl serde::Serialize for $item {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(
                    &self
                        .serialize_hex()
                        .map_err(|e| serde::ser::Error::custom(e.to_string()))?,
                )
            }
        }

        impl<'de> serde::Deserialize<'de> for $item {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s: String = serde::Deserialize::deserialize(deserializer)?;
                Self::deserialize_hex(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }
    };
}

/// Defines a newtype wrapping `Vec<u8>` that serializes as a varint-prefixed byte buffer
/// ("varbuff"): scripts and witness stack items are all, at the wire level, the same shape.
#[macro_export]
macro_rules! wrap_prefixed_byte_vector {
    ($wrapper_name:ident) => {
        #[doc = "A length-prefixed byte buffer."]
        #[derive(Clone, Debug, Eq, PartialEq, Default, Hash, PartialOrd, Ord)]
        pub struct $wrapper_name(Vec<u8>);

        impl $wrapper_name {
            /// Constructs a new instance from owned bytes.
            pub fn new(v: Vec<u8>) -> Self {
                Self(v)
            }

            /// Constructs the empty instance.
            pub fn null() -> Self {
                Self(vec![])
            }

            /// Returns a reference to the underlying bytes.
            pub fn items(&self) -> &[u8] {
                &self.0
            }

            /// Replaces the underlying bytes.
            pub fn set_items(&mut self, v: Vec<u8>) {
                self.0 = v;
            }

            /// Appends a byte.
            pub fn push(&mut self, b: u8) {
                self.0.push(b)
            }

            /// Returns the number of bytes.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Returns true if there are no bytes.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Returns the length of the varint prefix this buffer would be encoded with.
            pub fn len_prefix(&self) -> u8 {
                $crate::ser::prefix_byte_len(self.0.len() as u64)
            }
        }

        impl $crate::ser::ByteFormat for $wrapper_name {
            type Error = $crate::ser::SerError;

            fn encoded_len(&self) -> usize {
                self.len_prefix() as usize + self.0.len()
            }

            fn read_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Self::Error> {
                Ok(Self(Self::read_varbuff(reader)?))
            }

            fn write_to<W: std::io::Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
                Self::write_varbuff(writer, &self.0)
            }
        }

        impl AsRef<[u8]> for $wrapper_name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<&[u8]> for $wrapper_name {
            fn from(v: &[u8]) -> Self {
                Self(v.to_vec())
            }
        }

        impl From<Vec<u8>> for $wrapper_name {
            fn from(v: Vec<u8>) -> Self {
                Self(v)
            }
        }

        impl std::ops::Index<usize> for $wrapper_name {
            type Output = u8;

            fn index(&self, index: usize) -> &u8 {
                &self.0[index]
            }
        }

        impl std::ops::Index<std::ops::Range<usize>> for $wrapper_name {
            type Output = [u8];

            fn index(&self, index: std::ops::Range<usize>) -> &[u8] {
                &self.0[index]
            }
        }

        impl Extend<u8> for $wrapper_name {
            fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
                self.0.extend(iter)
            }
        }

        impl IntoIterator for $wrapper_name {
            type Item = u8;
            type IntoIter = std::vec::IntoIter<u8>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        $crate::impl_hex_serde!($wrapper_name);
    };
}

/// Implements bidirectional conversion between two byte-buffer newtypes that share the same wire
/// representation (e.g. a `ScriptSig` can always be reinterpreted as a `Script`).
#[macro_export]
macro_rules! impl_script_conversion {
    ($t1:ty, $t2:ty) => {
        impl From<&$t2> for $t1 {
            fn from(t: &$t2) -> $t1 {
                t.as_ref().into()
            }
        }

        impl From<&$t1> for $t2 {
            fn from(t: &$t1) -> $t2 {
                t.as_ref().into()
            }
        }
    };
}

/// Defines a newtype over a 32-byte double-SHA-256 digest, marked with its role (e.g. txid vs
/// wtxid) so the type system keeps them apart even though their wire representation is identical.
#[macro_export]
macro_rules! mark_hash256 {
    ($hash_name:ident) => {
        #[doc = "A 32-byte double-SHA-256 digest marked with its role."]
        #[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
        pub struct $hash_name($crate::hashes::Hash256Digest);

        $crate::impl_hex_serde!($hash_name);

        impl $hash_name {
            /// Parses this digest from a big-endian hex string (as printed by block explorers).
            pub fn from_be_hex(s: &str) -> Result<Self, $crate::ser::SerError> {
                let mut bytes = hex::decode(s)?;
                bytes.reverse();
                let mut cursor = std::io::Cursor::new(bytes.as_slice());
                <Self as $crate::ser::ByteFormat>::read_from(&mut cursor)
            }

            /// Renders this digest as a big-endian hex string (as printed by block explorers).
            pub fn to_be_hex(&self) -> String {
                let mut bytes = self.bytes();
                bytes.reverse();
                hex::encode(bytes)
            }
        }

        impl From<[u8; 32]> for $hash_name {
            fn from(buf: [u8; 32]) -> Self {
                Self($crate::hashes::Hash256Digest::from(buf))
            }
        }

        impl AsRef<[u8; 32]> for $hash_name {
            fn as_ref(&self) -> &[u8; 32] {
                self.0.as_ref()
            }
        }

        impl $crate::ser::ByteFormat for $hash_name {
            type Error = $crate::ser::SerError;

            fn encoded_len(&self) -> usize {
                32
            }

            fn read_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Self::Error> {
                Ok(Self($crate::hashes::Hash256Digest::read_from(reader)?))
            }

            fn write_to<W: std::io::Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
                self.0.write_to(writer)
            }
        }

        impl $crate::hashes::MarkedDigest for $hash_name {
            type Digest = $crate::hashes::Hash256Digest;

            fn new(hash: Self::Digest) -> Self {
                Self(hash)
            }

            fn internal(&self) -> Self::Digest {
                self.0
            }

            fn bytes(&self) -> Vec<u8> {
                self.0.as_ref().to_vec()
            }
        }

        impl From<$crate::hashes::Hash256Digest> for $hash_name {
            fn from(d: $crate::hashes::Hash256Digest) -> Self {
                Self(d)
            }
        }

        impl From<$hash_name> for $crate::hashes::Hash256Digest {
            fn from(d: $hash_name) -> Self {
                d.0
            }
        }
    };
}
