//! # Provisioning Manifest Decoding
//!
//! The payload of a signed `embedded.mobileprovision` is a property list,
//! usually XML, occasionally binary. [`Manifest::decode`] turns it into a
//! generic tree of dictionaries, arrays and scalars without interpreting it;
//! interpretation belongs to [`crate::policy`].
//!
//! A handful of descriptive fields (profile name, team, expiry) can be
//! pulled out through [`Manifest::summary`] for audit logging. They never
//! influence the accept/reject decision.

use std::io::Cursor;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use plist::{Dictionary, Value};
use serde::Deserialize;

use crate::error::ManifestError;

/// A decoded provisioning manifest. The root is always a dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    root: Dictionary,
}

impl Manifest {
    /// Decode an XML or binary property list.
    ///
    /// Fails on any structural malformation and when the root is not a
    /// dictionary. No partial tree is ever returned.
    pub fn decode(payload: &[u8]) -> Result<Self, ManifestError> {
        let value = Value::from_reader(Cursor::new(payload))?;
        match value {
            Value::Dictionary(root) => Ok(Self { root }),
            other => Err(ManifestError::NotADictionary(value_kind(&other))),
        }
    }

    /// Wrap an already-built dictionary.
    pub fn from_dictionary(root: Dictionary) -> Self {
        Self { root }
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// The whole tree.
    pub fn as_dictionary(&self) -> &Dictionary {
        &self.root
    }

    /// Re-encode the tree as an XML property list.
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>, ManifestError> {
        let mut out = Vec::new();
        Value::Dictionary(self.root.clone()).to_writer_xml(&mut out)?;
        Ok(out)
    }

    /// Extract the descriptive profile fields.
    ///
    /// Fields that are absent come back as `None`/empty; a field of the wrong
    /// type is a decode error.
    pub fn summary(&self) -> Result<ProfileSummary, ManifestError> {
        Ok(plist::from_value(&Value::Dictionary(self.root.clone()))?)
    }
}

/// Descriptive fields of a provisioning profile, for logs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileSummary {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "UUID", default)]
    pub uuid: Option<String>,
    #[serde(rename = "AppIDName", default)]
    pub app_id_name: Option<String>,
    #[serde(rename = "TeamIdentifier", default)]
    pub team_identifiers: Vec<String>,
    #[serde(rename = "TeamName", default)]
    pub team_name: Option<String>,
    #[serde(rename = "CreationDate", default)]
    pub creation_date: Option<plist::Date>,
    #[serde(rename = "ExpirationDate", default)]
    pub expiration_date: Option<plist::Date>,
}

impl ProfileSummary {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_date.map(to_utc)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration_date.map(to_utc)
    }

    /// Whether the profile's `ExpirationDate` lies before `now`. Profiles
    /// without an expiry are never considered expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp < now)
    }
}

fn to_utc(date: plist::Date) -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::from(date))
}

/// Human-readable name of a plist value's kind, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Dictionary(_) => "dictionary",
        Value::Boolean(_) => "boolean",
        Value::Data(_) => "data",
        Value::Date(_) => "date",
        Value::Real(_) => "real",
        Value::Integer(_) => "integer",
        Value::String(_) => "string",
        Value::Uid(_) => "uid",
        _ => "unknown",
    }
}
