//! # Object Digest: Content-Addressed Names
//!
//! Every stored upload is named by the lowercase hex SHA-1 digest of its
//! bytes. [`ObjectHasher`] accumulates the digest chunk by chunk so the store
//! can hash while it writes, without re-reading the upload.
//!
//! SHA-1 is used as a naming function for the flat storage layout, not as a
//! security boundary: trust decisions are made by the signed-manifest check.

use sha1::{Digest, Sha1};

use crate::error::DigestParseError;

/// Length of a rendered digest: 20 bytes, two hex characters each.
pub const DIGEST_HEX_LEN: usize = 40;

/// A SHA-1 digest over the full content of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectDigest([u8; 20]);

impl ObjectDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a 40-character hex string. Upper-case input is accepted and
    /// normalized; anything else is rejected.
    pub fn from_hex(s: &str) -> Result<Self, DigestParseError> {
        let s = s.trim();
        if s.len() != DIGEST_HEX_LEN {
            return Err(DigestParseError::Length(s.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| DigestParseError::Hex(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Render as lowercase hex. This is the stored object's filename.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for ObjectDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Incremental SHA-1 accumulator.
///
/// Feed chunks with [`update()`](ObjectHasher::update) in stream order, then
/// call [`finalize()`](ObjectHasher::finalize). Also usable as an
/// [`std::io::Write`] sink, which makes it a drop-in tee target.
#[derive(Debug, Clone, Default)]
pub struct ObjectHasher {
    inner: Sha1,
    len: u64,
}

impl ObjectHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb the next chunk of content.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Number of bytes absorbed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.len
    }

    /// Consume the hasher and produce the digest.
    pub fn finalize(self) -> ObjectDigest {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&self.inner.finalize());
        ObjectDigest(bytes)
    }
}

impl std::io::Write for ObjectHasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// One-shot SHA-1 digest of an in-memory buffer.
pub fn sha1_digest(data: &[u8]) -> ObjectDigest {
    let mut hasher = ObjectHasher::new();
    hasher.update(data);
    hasher.finalize()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Streaming in arbitrary chunk sizes never changes the digest.
        #[test]
        fn chunking_is_irrelevant(
            data in prop::collection::vec(any::<u8>(), 0..4096),
            chunk in 1usize..512,
        ) {
            let mut hasher = ObjectHasher::new();
            for c in data.chunks(chunk) {
                hasher.update(c);
            }
            prop_assert_eq!(hasher.finalize(), sha1_digest(&data));
        }
    }
}
