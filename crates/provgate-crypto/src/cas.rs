//! # Content-Addressed Storage (CAS)
//!
//! Persists uploads in a flat directory, one file per distinct content,
//! named by the lowercase hex SHA-1 of the bytes: `{data_dir}/{digest_hex}`.
//!
//! ## Write Path
//!
//! [`ContentAddressedStore::put`] copies the upload into a staging file
//! inside `data_dir` and feeds every chunk to the digest in the same pass.
//! Once the stream ends, the staging file is published under its digest
//! name with a no-clobber atomic persist. The staging file lives in the data
//! directory so the publish never crosses a filesystem boundary.
//!
//! ## Duplicate Content
//!
//! A second upload of identical bytes is a client error, not a no-op: the
//! persist fails with `AlreadyExists` and the call returns
//! [`CryptoError::DuplicateContent`]. Two concurrent uploads of the same
//! content race on that persist and exactly one wins; the loser never
//! touches the winner's file.
//!
//! ## Cleanup
//!
//! The staging file is a [`tempfile::NamedTempFile`]; dropping it deletes
//! it. Every failure path (read error, size limit, duplicate, panic)
//! therefore leaves no file behind.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use provgate_core::{ObjectDigest, ObjectHasher};

use crate::error::CryptoError;

/// Chunk size for the copy loop.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

/// Prefix of staging files. The leading dot keeps them out of casual
/// listings and they can never collide with a 40-char hex name.
const STAGING_PREFIX: &str = ".uploading.";

// ---------------------------------------------------------------------------
// StoredObject
// ---------------------------------------------------------------------------

/// An object that has been durably published in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// SHA-1 over the full content.
    pub digest: ObjectDigest,
    /// `{data_dir}/{digest_hex}`.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

// ---------------------------------------------------------------------------
// ContentAddressedStore
// ---------------------------------------------------------------------------

/// Filesystem-backed content-addressed object store.
#[derive(Debug, Clone)]
pub struct ContentAddressedStore {
    data_dir: PathBuf,
    max_bytes: Option<u64>,
}

impl ContentAddressedStore {
    /// Create a store rooted at `data_dir`. The directory must already exist;
    /// checking that is the caller's startup concern.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_bytes: None,
        }
    }

    /// Refuse uploads larger than `limit` bytes.
    pub fn with_max_bytes(mut self, limit: u64) -> Self {
        self.max_bytes = Some(limit);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Path an object with this digest is (or would be) stored at.
    pub fn path_for(&self, digest: &ObjectDigest) -> PathBuf {
        self.data_dir.join(digest.to_hex())
    }

    /// Stream `reader` into the store, hashing as it is written.
    ///
    /// Returns the published object, or an error with nothing left on disk.
    pub fn put<R: Read>(&self, mut reader: R) -> Result<StoredObject, CryptoError> {
        let mut staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.data_dir)
            .map_err(CryptoError::TempFile)?;

        let mut hasher = ObjectHasher::new();
        let mut buf = vec![0u8; COPY_CHUNK_BYTES];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    return Err(CryptoError::ReadTimeout(e));
                }
                Err(e) => return Err(CryptoError::Copy(e)),
            };
            if let Some(limit) = self.max_bytes {
                if hasher.bytes_hashed() + n as u64 > limit {
                    return Err(CryptoError::TooLarge { limit });
                }
            }
            hasher.update(&buf[..n]);
            staging.write_all(&buf[..n]).map_err(CryptoError::Copy)?;
        }
        staging.as_file().sync_all().map_err(CryptoError::Copy)?;

        let size = hasher.bytes_hashed();
        let digest = hasher.finalize();
        let path = self.path_for(&digest);

        // persist_noclobber is an atomic create-if-absent: there is no window
        // between an existence check and the rename.
        match staging.persist_noclobber(&path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                return Err(CryptoError::DuplicateContent { path });
            }
            Err(e) => return Err(CryptoError::Persist(e.error)),
        }

        tracing::debug!(digest = %digest, size, path = %path.display(), "object stored");
        Ok(StoredObject { digest, path, size })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Storing any byte sequence twice yields exactly one object and a
        /// duplicate-content error.
        #[test]
        fn storing_twice_yields_one_object(data in prop::collection::vec(any::<u8>(), 0..8192)) {
            let dir = tempfile::tempdir().unwrap();
            let cas = ContentAddressedStore::new(dir.path());

            let first = cas.put(Cursor::new(data.clone())).unwrap();
            let second = cas.put(Cursor::new(data.clone()));

            prop_assert!(
                matches!(second, Err(CryptoError::DuplicateContent { .. })),
                "expected DuplicateContent, got {:?}",
                second
            );
            prop_assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
            prop_assert_eq!(std::fs::read(&first.path).unwrap(), data);
        }
    }
}
