//! # Error Types
//!
//! Structured errors for digest parsing, manifest decoding and the policy
//! check. Policy errors name the field path they concern so a rejection can
//! be audited from the log line alone.

use thiserror::Error;

/// A hex string could not be parsed into an [`ObjectDigest`](crate::ObjectDigest).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestParseError {
    #[error("digest must be 40 hex chars, got {0} chars")]
    Length(usize),

    #[error("digest is not valid hex: {0}")]
    Hex(String),
}

/// The signed payload is not a usable property list.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Structural malformation: not XML/binary plist, truncated, bad nesting.
    #[error("plist decode error: {0}")]
    Decode(#[from] plist::Error),

    /// The payload decoded, but its root is not a dictionary.
    #[error("plist root must be a dictionary, found {0}")]
    NotADictionary(&'static str),
}

/// The manifest does not authorize the expected application identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A key on the navigation path is absent.
    #[error("missing field: {path}")]
    MissingField { path: String },

    /// A key is present but holds the wrong kind of value.
    #[error("wrong type at {path}: expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The identifier is well-formed but not the one this gate accepts.
    #[error("invalid appid: `{actual}` but `{expected}` is expected")]
    Mismatch { actual: String, expected: String },
}
