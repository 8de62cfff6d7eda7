//! # Application State
//!
//! Shared state handed to every handler. The pipeline is immutable after
//! startup, so cloning the state is a reference-count bump.

use std::sync::Arc;
use std::time::Duration;

use provgate_pipeline::{PipelineConfig, UploadPipeline};

/// Default idle limit between request body chunks.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<UploadPipeline>,
    /// Longest pause between body chunks before the upload is abandoned.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            pipeline: Arc::new(UploadPipeline::new(config)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
