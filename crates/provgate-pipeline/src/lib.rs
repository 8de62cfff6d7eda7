//! # provgate-pipeline: Upload Inspection
//!
//! Composes the store, the signed-content verifier, the manifest decoder
//! and the policy check into one blocking pipeline:
//!
//! - **Archive inspection** ([`ArchiveInspector`]): opens the stored upload
//!   as a ZIP archive and lists every `embedded.mobileprovision` member.
//! - **Pipeline** ([`UploadPipeline`]): streams the upload into the store,
//!   then verifies and checks each manifest member, stopping at the first
//!   failure.
//!
//! Errors classify themselves as client or server faults through
//! [`PipelineError::fault`].

pub mod archive;
pub mod error;
pub mod pipeline;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use archive::{ArchiveInspector, ArchiveMember, MANIFEST_SUFFIX, MAX_MANIFEST_BYTES};
pub use error::{Fault, PipelineError};
pub use pipeline::{
    Accepted, PipelineConfig, UploadPipeline, UploadStage, DEFAULT_MAX_UPLOAD_BYTES,
};
