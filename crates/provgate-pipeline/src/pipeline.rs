//! # Upload Pipeline
//!
//! Drives one upload from bytes-on-the-wire to a verdict:
//!
//! ```text
//! Receiving → Stored → Inspecting → (per manifest member:
//!     Verifying → Decoding → Checking) → Accepted | Rejected
//! ```
//!
//! The first failure ends the run and is logged at the `rejected` stage
//! together with the label of the stage that failed. The stored object
//! stays on disk after a rejection; storage happens before inspection and
//! is not undone.
//!
//! Everything here is blocking I/O. Async callers run [`UploadPipeline::process`]
//! on a blocking thread.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;
use provgate_core::{policy, Manifest};
use provgate_crypto::{smime, ContentAddressedStore, StoredObject};

use crate::archive::{ArchiveInspector, ArchiveMember, MANIFEST_SUFFIX};
use crate::error::PipelineError;

/// Default upload cap: 1 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Explicit pipeline configuration, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Store root. Must exist and be a directory.
    pub data_dir: PathBuf,
    /// The only application identifier a manifest may authorize.
    pub expected_app_id: String,
    /// Log the stored path and every decoded manifest tree.
    pub debug: bool,
    /// Largest accepted upload, or `None` for no limit.
    pub max_upload_bytes: Option<u64>,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, expected_app_id: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            expected_app_id: expected_app_id.into(),
            debug: false,
            max_upload_bytes: Some(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}

// ---------------------------------------------------------------------------
// Stages and outcome
// ---------------------------------------------------------------------------

/// Where an upload is in its lifecycle. Used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Receiving,
    Stored,
    Inspecting,
    Verifying,
    Decoding,
    Checking,
    Accepted,
    Rejected,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receiving => "receiving",
            Self::Stored => "stored",
            Self::Inspecting => "inspecting",
            Self::Verifying => "verifying",
            Self::Decoding => "decoding",
            Self::Checking => "checking",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub object: StoredObject,
    /// Number of manifest members verified. Zero when the archive has none.
    pub manifests_checked: usize,
}

// ---------------------------------------------------------------------------
// UploadPipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UploadPipeline {
    config: PipelineConfig,
    store: ContentAddressedStore,
}

impl UploadPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let mut store = ContentAddressedStore::new(config.data_dir.clone());
        if let Some(limit) = config.max_upload_bytes {
            store = store.with_max_bytes(limit);
        }
        Self { config, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentAddressedStore {
        &self.store
    }

    /// Store the upload, then inspect it.
    pub fn process<R: Read>(&self, reader: R) -> Result<Accepted, PipelineError> {
        self.run(reader).map_err(|e| {
            tracing::info!(
                stage = %UploadStage::Rejected,
                failed_stage = e.stage(),
                error = %e,
                "upload rejected"
            );
            e
        })
    }

    fn run<R: Read>(&self, reader: R) -> Result<Accepted, PipelineError> {
        tracing::debug!(stage = %UploadStage::Receiving, "receiving upload");
        let object = self.store.put(reader).map_err(PipelineError::Store)?;
        tracing::info!(
            stage = %UploadStage::Stored,
            digest = %object.digest,
            size = object.size,
            "upload stored"
        );
        if self.config.debug {
            tracing::info!(path = %object.path.display(), "stored upload at path");
        }

        let manifests_checked = self.inspect(&object.path)?;
        tracing::info!(
            stage = %UploadStage::Accepted,
            digest = %object.digest,
            manifests_checked,
            "upload accepted"
        );
        Ok(Accepted {
            object,
            manifests_checked,
        })
    }

    /// Check every manifest inside an already-stored archive. Returns how
    /// many were verified.
    pub fn inspect(&self, path: &Path) -> Result<usize, PipelineError> {
        tracing::debug!(stage = %UploadStage::Inspecting, path = %path.display(), "opening archive");
        let mut archive = ArchiveInspector::open(path)?;
        let manifests = archive.manifest_members();

        if manifests.is_empty() {
            tracing::warn!(
                path = %path.display(),
                members = archive.members().len(),
                "archive contains no {MANIFEST_SUFFIX}; accepting without identifier check"
            );
            return Ok(0);
        }

        manifests.iter().try_fold(0usize, |checked, member| {
            self.check_member(&mut archive, member)?;
            Ok(checked + 1)
        })
    }

    fn check_member(
        &self,
        archive: &mut ArchiveInspector,
        member: &ArchiveMember,
    ) -> Result<(), PipelineError> {
        let signed = archive.read_member(member)?;

        tracing::debug!(stage = %UploadStage::Verifying, member = %member.name, "verifying signature");
        let verified = smime::verify(&signed).map_err(|source| PipelineError::Signature {
            name: member.name.clone(),
            source,
        })?;

        tracing::debug!(stage = %UploadStage::Decoding, member = %member.name, "decoding manifest");
        let manifest =
            Manifest::decode(&verified.payload).map_err(|source| PipelineError::Manifest {
                name: member.name.clone(),
                source,
            })?;
        if self.config.debug {
            tracing::info!(member = %member.name, "decoded manifest:\n{:#?}", manifest.as_dictionary());
        }
        log_profile(&manifest, member, &verified.signers);

        tracing::debug!(stage = %UploadStage::Checking, member = %member.name, "checking application identifier");
        let decision = policy::check(&manifest, &self.config.expected_app_id)
            .and_then(|d| d.into_result())
            .map_err(|source| PipelineError::Policy {
                name: member.name.clone(),
                source,
            })?;
        tracing::info!(member = %member.name, appid = %decision.actual, "{}", decision.reason);
        Ok(())
    }
}

/// Audit-log the descriptive profile fields. Never affects the verdict.
fn log_profile(manifest: &Manifest, member: &ArchiveMember, signers: &[String]) {
    let summary = match manifest.summary() {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(member = %member.name, error = %e, "profile summary unavailable");
            return;
        }
    };
    tracing::info!(
        member = %member.name,
        profile = summary.name.as_deref().unwrap_or("-"),
        uuid = summary.uuid.as_deref().unwrap_or("-"),
        team = ?summary.team_identifiers,
        signers = ?signers,
        expires = ?summary.expires_at(),
        "provisioning profile"
    );
    if summary.is_expired_at(Utc::now()) {
        tracing::warn!(
            member = %member.name,
            expires = ?summary.expires_at(),
            "provisioning profile has expired"
        );
    }
}
