//! # Application-Identifier Policy
//!
//! A provisioning manifest authorizes exactly one application identifier,
//! found at `Entitlements.application-identifier`. The gate accepts a
//! manifest only when that identifier equals the configured one.
//!
//! Navigation is explicit: every step checks both presence and shape.
//! An attacker who omits the field, or replaces the dictionary with a
//! string, gets a [`PolicyError`], never an implicit pass.

use plist::{Dictionary, Value};

use crate::error::PolicyError;
use crate::manifest::{value_kind, Manifest};

/// Top-level key holding the entitlement dictionary.
pub const ENTITLEMENTS_KEY: &str = "Entitlements";

/// Entitlement naming the authorized application.
pub const APPLICATION_IDENTIFIER_KEY: &str = "application-identifier";

/// Outcome of comparing a manifest's identifier with the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub ok: bool,
    pub actual: String,
    pub expected: String,
    pub reason: String,
}

impl PolicyDecision {
    /// Turn a negative decision into a [`PolicyError::Mismatch`].
    pub fn into_result(self) -> Result<Self, PolicyError> {
        if self.ok {
            Ok(self)
        } else {
            Err(PolicyError::Mismatch {
                actual: self.actual,
                expected: self.expected,
            })
        }
    }
}

/// Check `Entitlements.application-identifier` against `expected_app_id`.
///
/// Returns `Err` when the field is missing or mis-shaped; returns a decision
/// with `ok == false` when it is present but different. Comparison is exact
/// (case-sensitive, no wildcard expansion).
pub fn check(manifest: &Manifest, expected_app_id: &str) -> Result<PolicyDecision, PolicyError> {
    let actual = application_identifier(manifest)?;
    let ok = actual == expected_app_id;
    let reason = if ok {
        format!("application identifier `{actual}` matches")
    } else {
        format!("invalid appid: `{actual}` but `{expected_app_id}` is expected")
    };
    Ok(PolicyDecision {
        ok,
        actual: actual.to_string(),
        expected: expected_app_id.to_string(),
        reason,
    })
}

/// Extract `Entitlements.application-identifier` with typed navigation.
pub fn application_identifier(manifest: &Manifest) -> Result<&str, PolicyError> {
    let entitlements = entitlements(manifest)?;
    let path = format!("{ENTITLEMENTS_KEY}.{APPLICATION_IDENTIFIER_KEY}");
    match entitlements.get(APPLICATION_IDENTIFIER_KEY) {
        None => Err(PolicyError::MissingField { path }),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(PolicyError::WrongType {
            path,
            expected: "string",
            found: value_kind(other),
        }),
    }
}

fn entitlements(manifest: &Manifest) -> Result<&Dictionary, PolicyError> {
    match manifest.get(ENTITLEMENTS_KEY) {
        None => Err(PolicyError::MissingField {
            path: ENTITLEMENTS_KEY.to_string(),
        }),
        Some(Value::Dictionary(d)) => Ok(d),
        Some(other) => Err(PolicyError::WrongType {
            path: ENTITLEMENTS_KEY.to_string(),
            expected: "dictionary",
            found: value_kind(other),
        }),
    }
}
