//! # provgate-core: Foundational Types
//!
//! Shared building blocks for the upload gatekeeper:
//!
//! - **Object digests** ([`ObjectDigest`]): the SHA-1 fingerprint that names
//!   every stored upload, plus a streaming [`ObjectHasher`].
//! - **Manifest decoding** ([`Manifest`]): property-list payloads of
//!   `embedded.mobileprovision` files, XML or binary.
//! - **Policy check** ([`policy::check`]): typed navigation to
//!   `Entitlements.application-identifier` and comparison with the expected
//!   identifier.
//!
//! Nothing in this crate touches the filesystem or the network.

pub mod digest;
pub mod error;
pub mod manifest;
pub mod policy;

pub use digest::{sha1_digest, ObjectDigest, ObjectHasher, DIGEST_HEX_LEN};
pub use error::{DigestParseError, ManifestError, PolicyError};
pub use manifest::{Manifest, ProfileSummary};
pub use policy::{PolicyDecision, APPLICATION_IDENTIFIER_KEY, ENTITLEMENTS_KEY};
