//! Test fixtures: throwaway self-signed signers and PKCS#7 builders.
//!
//! Compiled for this crate's own tests and, through the `testing` feature,
//! for downstream crates' tests.

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::{X509NameBuilder, X509};

/// A self-signed certificate and its private key.
pub struct TestSigner {
    key: PKey<Private>,
    cert: X509,
}

impl TestSigner {
    /// Generate an RSA-2048 key and a one-year self-signed certificate
    /// with subject `CN={common_name}`.
    pub fn generate(common_name: &str) -> Result<Self, ErrorStack> {
        let key = PKey::from_rsa(Rsa::generate(2048)?)?;

        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_text("CN", common_name)?;
        let name = name.build();

        let mut builder = X509::builder()?;
        builder.set_version(2)?;
        let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(&key)?;
        builder.set_not_before(&*Asn1Time::days_from_now(0)?)?;
        builder.set_not_after(&*Asn1Time::days_from_now(365)?)?;
        builder.sign(&key, MessageDigest::sha256())?;

        Ok(Self {
            key,
            cert: builder.build(),
        })
    }

    pub fn certificate(&self) -> &X509 {
        &self.cert
    }

    /// Sign `payload` with embedded content, signer certificate included.
    pub fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, ErrorStack> {
        self.sign_with(payload, Pkcs7Flags::BINARY)
    }

    /// Sign without embedding the content.
    pub fn sign_detached(&self, payload: &[u8]) -> Result<Vec<u8>, ErrorStack> {
        self.sign_with(payload, Pkcs7Flags::BINARY | Pkcs7Flags::DETACHED)
    }

    /// Sign with embedded content but leave the signer certificate out.
    pub fn sign_without_certs(&self, payload: &[u8]) -> Result<Vec<u8>, ErrorStack> {
        self.sign_with(payload, Pkcs7Flags::BINARY | Pkcs7Flags::NOCERTS)
    }

    fn sign_with(&self, payload: &[u8], flags: Pkcs7Flags) -> Result<Vec<u8>, ErrorStack> {
        let extra = Stack::<X509>::new()?;
        Pkcs7::sign(&self.cert, &self.key, &extra, payload, flags)?.to_der()
    }
}

/// Flip one byte inside the first occurrence of `needle` in `der`.
///
/// Used to alter embedded content after signing. Panics if `needle` does
/// not occur.
pub fn tamper(der: &[u8], needle: &[u8]) -> Vec<u8> {
    let pos = der
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap_or_else(|| panic!("needle {:?} not found in DER", String::from_utf8_lossy(needle)));
    let mut out = der.to_vec();
    let target = pos + needle.len() / 2;
    out[target] ^= 0x01;
    out
}
