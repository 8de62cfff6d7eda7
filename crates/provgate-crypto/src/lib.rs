//! # provgate-crypto: Storage and Signature Primitives
//!
//! - **Content-Addressed Store** ([`ContentAddressedStore`]): streams an
//!   upload to disk while hashing it, then publishes it under its hex SHA-1
//!   name with an atomic no-clobber rename. Duplicate content is refused.
//! - **Signed-content verification** ([`smime::verify`]): parses a DER
//!   PKCS#7 SignedData blob, checks its signature against the certificates
//!   it carries, and returns the signed payload.
//!
//! Enable the `testing` feature for certificate and signing helpers used by
//! downstream test suites.

pub mod cas;
pub mod error;
pub mod smime;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cas::{ContentAddressedStore, StoredObject};
pub use error::CryptoError;
pub use smime::{verify, VerifiedContent};
