//! # Pipeline Error Types
//!
//! Every failure carries the stage it happened in and the archive member
//! it concerns. [`PipelineError::fault`] decides who is to blame, which the
//! HTTP boundary maps to a status code.

use std::path::PathBuf;

use provgate_core::{ManifestError, PolicyError};
use provgate_crypto::CryptoError;
use thiserror::Error;
use zip::result::ZipError;

/// Who caused a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The upload itself is unacceptable.
    Client,
    /// The server could not do its job.
    Server,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Streaming the upload into the store failed or was refused.
    #[error("{0}")]
    Store(#[source] CryptoError),

    /// The object just published in the store could not be reopened.
    #[error("open stored upload {}: {source}", path.display())]
    ReadStored {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored upload is not a readable ZIP archive.
    #[error("open zip: {0}")]
    OpenArchive(#[source] ZipError),

    /// A member could not be located or decompressed.
    #[error("open file in zip `{name}`: {source}")]
    OpenMember {
        name: String,
        #[source]
        source: ZipError,
    },

    /// Reading a member's decompressed bytes failed.
    #[error("read file in zip `{name}`: {source}")]
    ReadMember {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A manifest member decompresses to more than the allowed size.
    #[error("open file in zip `{name}`: larger than {limit} bytes")]
    MemberTooLarge { name: String, limit: u64 },

    /// The member is not a verifiable signed message.
    #[error("smime error in `{name}`: {source}")]
    Signature {
        name: String,
        #[source]
        source: CryptoError,
    },

    /// The signed payload is not a property-list dictionary.
    #[error("failed to parse mobileprovision `{name}`: {source}")]
    Manifest {
        name: String,
        #[source]
        source: ManifestError,
    },

    /// The manifest does not authorize the expected application.
    #[error("{source} (in `{name}`)")]
    Policy {
        name: String,
        #[source]
        source: PolicyError,
    },
}

impl PipelineError {
    pub fn fault(&self) -> Fault {
        match self {
            Self::Store(CryptoError::TempFile(_) | CryptoError::Copy(_) | CryptoError::Persist(_))
            | Self::ReadStored { .. } => Fault::Server,
            Self::Store(_) => Fault::Client,
            Self::OpenArchive(_)
            | Self::OpenMember { .. }
            | Self::ReadMember { .. }
            | Self::MemberTooLarge { .. }
            | Self::Signature { .. }
            | Self::Manifest { .. }
            | Self::Policy { .. } => Fault::Client,
        }
    }

    /// The client stopped sending the body before it was complete.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Store(CryptoError::ReadTimeout(_)))
    }

    /// Short stage label for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Store(_) => "store",
            Self::ReadStored { .. } | Self::OpenArchive(_) => "open zip",
            Self::OpenMember { .. } | Self::ReadMember { .. } | Self::MemberTooLarge { .. } => {
                "open file in zip"
            }
            Self::Signature { .. } => "smime",
            Self::Manifest { .. } => "parse mobileprovision",
            Self::Policy { .. } => "appid",
        }
    }
}
