//! # Signed-Content (PKCS#7 / CMS) Verification
//!
//! Provisioning manifests are DER-encoded PKCS#7 `SignedData` with the
//! property list embedded as the signed content. [`verify`] checks that
//! the signature is internally consistent with one of the signer
//! certificates carried in the structure and returns the embedded payload.
//!
//! ## Trust
//!
//! Certificate chains are NOT validated against any trust anchor: the
//! store passed to OpenSSL is empty and `NOVERIFY` is set. A self-signed
//! certificate yields a valid result. What is checked is that the content
//! was not altered after signing.
//!
//! ## Fail-Closed Cases
//!
//! - Input that is not PKCS#7 DER: [`CryptoError::SmimeParse`].
//! - `SignedData` without embedded content (detached signature).
//! - No signer certificate inside the structure.
//! - Signature or digest mismatch.
//!
//! All of the last three are [`CryptoError::SmimeVerify`].

use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509NameRef, X509};

use crate::error::CryptoError;

/// The payload of a verified signed-content structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedContent {
    /// The exact embedded content bytes.
    pub payload: Vec<u8>,
    /// Subject names of the signer certificates, e.g. `CN=Signer, O=Example`.
    pub signers: Vec<String>,
}

/// Verify a DER-encoded PKCS#7 `SignedData` and return its payload.
pub fn verify(der: &[u8]) -> Result<VerifiedContent, CryptoError> {
    let pkcs7 = Pkcs7::from_der(der).map_err(|e| CryptoError::SmimeParse(e.to_string()))?;

    let no_extra_certs = Stack::<X509>::new().map_err(|e| CryptoError::SmimeVerify(e.to_string()))?;

    let signers = pkcs7
        .signers(&no_extra_certs, Pkcs7Flags::empty())
        .map_err(|e| CryptoError::SmimeVerify(format!("no usable signer certificate: {e}")))?;
    let signer_names: Vec<String> = signers
        .iter()
        .map(|cert| render_name(cert.subject_name()))
        .collect();
    if signer_names.is_empty() {
        return Err(CryptoError::SmimeVerify(
            "no usable signer certificate".to_string(),
        ));
    }

    let store = X509StoreBuilder::new()
        .map_err(|e| CryptoError::SmimeVerify(e.to_string()))?
        .build();

    // With no indata, OpenSSL reads the embedded content; a detached
    // signature has none and fails here.
    let mut payload = Vec::new();
    pkcs7
        .verify(
            &no_extra_certs,
            &store,
            None,
            Some(&mut payload),
            Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
        )
        .map_err(|e| CryptoError::SmimeVerify(e.to_string()))?;

    tracing::debug!(signers = ?signer_names, payload_len = payload.len(), "pkcs7 verified");
    Ok(VerifiedContent {
        payload,
        signers: signer_names,
    })
}

/// Render an X.509 name as `SN=value, SN=value`.
fn render_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            let value = entry
                .data()
                .as_utf8()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| "<non-utf8>".to_string());
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
