//! End-to-end upload scenarios over a real socket.
//!
//! A server is started on an ephemeral port and archives are PUT with an
//! HTTP client, so the request body travels through hyper, the sync bridge
//! and the blocking pipeline exactly as in production. The body timeout
//! tests write raw HTTP/1.1 over a `TcpStream` so they control pacing.

mod common;

use std::time::Duration;

use common::{config, dir_entries, start_server, start_server_with_timeout};
use provgate_core::sha1_digest;
use provgate_crypto::testing::{tamper, TestSigner};
use provgate_pipeline::testing::{app_archive, signed_profile, zip_archive, TEST_APP_ID};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn put(url: &str, body: Vec<u8>) -> (u16, String) {
    let resp = reqwest::Client::new()
        .put(url)
        .body(body)
        .send()
        .await
        .expect("request failed");
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn matching_identifier_is_accepted_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let bytes = app_archive(&signer, TEST_APP_ID);

    let (status, body) = put(&server.url("/upload"), bytes.clone()).await;

    assert_eq!(status, 200);
    assert_eq!(body, "OK");
    let name = sha1_digest(&bytes).to_hex();
    assert_eq!(dir_entries(dir.path()), vec![name.clone()]);
    assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), bytes);
}

#[tokio::test(flavor = "multi_thread")]
async fn other_identifier_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), "XYZ.other")).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();

    let (status, body) = put(&server.url("/upload"), app_archive(&signer, TEST_APP_ID)).await;

    assert_eq!(status, 400);
    assert_eq!(body, "Bad Request");
    // Storage precedes inspection; the rejected object remains.
    assert_eq!(dir_entries(dir.path()).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn reupload_of_identical_bytes_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let bytes = app_archive(&signer, TEST_APP_ID);

    assert_eq!(put(&server.url("/upload"), bytes.clone()).await.0, 200);
    assert_eq!(put(&server.url("/upload"), bytes).await.0, 400);
    assert_eq!(dir_entries(dir.path()).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn tampered_manifest_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let profile = tamper(&signed_profile(&signer, TEST_APP_ID), b"My App Distribution");
    let bytes = zip_archive(&[("Payload/MyApp.app/embedded.mobileprovision", &profile)]);

    assert_eq!(put(&server.url("/upload"), bytes).await.0, 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn corrupt_archive_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let mut bytes = app_archive(&signer, TEST_APP_ID);
    bytes.truncate(bytes.len() / 2);

    assert_eq!(put(&server.url("/upload"), bytes).await.0, 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn archive_without_manifest_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let bytes = zip_archive(&[("Payload/MyApp.app/Info.plist", b"<plist/>")]);

    assert_eq!(put(&server.url("/upload"), bytes).await.0, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn nested_extension_with_other_identifier_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let main = signed_profile(&signer, TEST_APP_ID);
    let ext = signed_profile(&signer, "ABC.myapp.share");
    let bytes = zip_archive(&[
        ("Payload/MyApp.app/embedded.mobileprovision", &main),
        ("Payload/MyApp.app/PlugIns/Share.appex/embedded.mobileprovision", &ext),
    ]);

    assert_eq!(put(&server.url("/upload"), bytes).await.0, 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn large_upload_streams_through() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let padding: Vec<u8> = (0..8 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    let profile = signed_profile(&signer, TEST_APP_ID);
    let bytes = zip_archive(&[
        ("Payload/MyApp.app/Assets.car", &padding),
        ("Payload/MyApp.app/embedded.mobileprovision", &profile),
    ]);

    let (status, _) = put(&server.url("/upload"), bytes.clone()).await;

    assert_eq!(status, 200);
    assert_eq!(dir_entries(dir.path()), vec![sha1_digest(&bytes).to_hex()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_upload_is_rejected_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let server =
        start_server(config(dir.path(), TEST_APP_ID).with_max_upload_bytes(Some(1024))).await;

    let (status, _) = put(&server.url("/upload"), vec![7u8; 4096]).await;

    assert_eq!(status, 400);
    assert!(dir_entries(dir.path()).is_empty());
}

/// Send the request line and headers of a PUT /upload declaring `length`.
async fn start_raw_upload(addr: std::net::SocketAddr, length: usize) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "PUT /upload HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {length}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream
}

/// Read until the end of the response head, or fail after five seconds.
async fn read_response_head(stream: &mut TcpStream) -> String {
    let mut response = Vec::new();
    let mut buf = [0u8; 1024];
    tokio::time::timeout(Duration::from_secs(5), async {
        while !response.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            response.extend_from_slice(&buf[..n]);
        }
    })
    .await
    .expect("no response within the deadline");
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_body_times_out_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let server =
        start_server_with_timeout(config(dir.path(), TEST_APP_ID), Duration::from_millis(300))
            .await;

    // Promise 100000 bytes, send two, then go quiet with the socket open.
    let mut stream = start_raw_upload(server.addr, 100_000).await;
    stream.write_all(b"PK").await.unwrap();

    let head = read_response_head(&mut stream).await;
    assert!(head.starts_with("HTTP/1.1 408"), "unexpected response: {head}");
    assert!(dir_entries(dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_but_steady_body_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let server =
        start_server_with_timeout(config(dir.path(), TEST_APP_ID), Duration::from_millis(500))
            .await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let bytes = app_archive(&signer, TEST_APP_ID);

    // Each pause is shorter than the idle limit; the total is longer.
    let mut stream = start_raw_upload(server.addr, bytes.len()).await;
    for chunk in bytes.chunks(bytes.len() / 4 + 1) {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stream.write_all(chunk).await.unwrap();
    }

    let head = read_response_head(&mut stream).await;
    assert!(head.starts_with("HTTP/1.1 200"), "unexpected response: {head}");
    assert_eq!(dir_entries(dir.path()), vec![sha1_digest(&bytes).to_hex()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_identical_uploads_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let signer = TestSigner::generate("E2E Signer").unwrap();
    let bytes = app_archive(&signer, TEST_APP_ID);
    let url = server.url("/upload");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let (url, bytes) = (url.clone(), bytes.clone());
        handles.push(tokio::spawn(async move { put(&url, bytes).await.0 }));
    }
    let mut statuses = Vec::new();
    for h in handles {
        statuses.push(h.await.unwrap());
    }
    statuses.sort();

    assert_eq!(statuses, vec![200, 400, 400, 400]);
    assert_eq!(dir_entries(dir.path()).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn static_routes() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_server(config(dir.path(), TEST_APP_ID)).await;
    let client = reqwest::Client::new();

    let home = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(home.status().as_u16(), 200);
    assert_eq!(home.text().await.unwrap(), "Welcome to the home page!");

    let missing = client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let get_upload = client.get(server.url("/upload")).send().await.unwrap();
    assert_eq!(get_upload.status().as_u16(), 404);
}
