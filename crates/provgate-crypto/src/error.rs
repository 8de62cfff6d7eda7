//! # Storage and Signature Error Types
//!
//! One enum for everything `provgate-crypto` can fail at. Variants keep the
//! stage wording operators grep for (`create tmpfile`, `copy to tmpfile`,
//! `already exists`, `failed to verify`).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// The temporary staging file could not be created.
    #[error("create tmpfile: {0}")]
    TempFile(#[source] std::io::Error),

    /// Reading the upload or writing the staging file failed.
    #[error("copy to tmpfile: {0}")]
    Copy(#[source] std::io::Error),

    /// The upload stream stopped delivering bytes before it ended.
    #[error("copy to tmpfile: upload stalled: {0}")]
    ReadTimeout(#[source] std::io::Error),

    /// The upload exceeded the store's byte limit.
    #[error("upload exceeds limit of {limit} bytes")]
    TooLarge { limit: u64 },

    /// An object with the same digest is already stored.
    #[error("{} already exists", path.display())]
    DuplicateContent { path: PathBuf },

    /// Publishing the staging file under its digest name failed.
    #[error("failed to rename tmpfile: {0}")]
    Persist(#[source] std::io::Error),

    /// The input is not a well-formed PKCS#7 structure.
    #[error("failed to parse pkcs7: {0}")]
    SmimeParse(String),

    /// The PKCS#7 structure is well-formed but does not verify.
    #[error("failed to verify: {0}")]
    SmimeVerify(String),
}
