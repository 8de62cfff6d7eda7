//! Shared helpers for the end-to-end suites.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use provgate_api::state::AppState;
use provgate_pipeline::PipelineConfig;

/// A server bound to an ephemeral port. Dropping it shuts the server down.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the full application with the default request timeout.
pub async fn start_server(config: PipelineConfig) -> TestServer {
    serve(AppState::new(config)).await
}

/// Start the full application with a short body idle timeout.
pub async fn start_server_with_timeout(config: PipelineConfig, timeout: Duration) -> TestServer {
    serve(AppState::new(config).with_request_timeout(timeout)).await
}

async fn serve(state: AppState) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let app = provgate_api::app(state);
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await
            .ok();
    });

    TestServer {
        addr,
        _shutdown: tx,
    }
}

pub fn config(data_dir: &Path, app_id: &str) -> PipelineConfig {
    PipelineConfig::new(data_dir, app_id)
}

/// Names of everything in `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
