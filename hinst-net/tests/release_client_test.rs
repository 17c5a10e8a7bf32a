//! Release metadata and download behaviour against a local mock of the
//! GitHub API and release asset host.

use std::io::{Read, Write};
use std::net::TcpListener;

use hinst_common::config::Config;
use hinst_common::error::HinstError;
use hinst_common::model::{Arch, Os, PlatformTarget};
use hinst_net::{
    build_http_client, download_to_file, fetch_checksum_manifest, fetch_latest_tag,
    resolve_release,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::new("org/tool", "tool");
    config.api_base_url = server.uri();
    config.download_base_url = server.uri();
    config.allow_insecure_urls = true;
    config
}

// ── GET /repos/{repo}/releases/latest ──────────────────────────────────

#[tokio::test]
async fn latest_tag_is_read_from_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/tool/releases/latest"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tag_name": "v1.2.3",
            "name": "v1.2.3",
            "assets": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_http_client().unwrap();
    let tag = fetch_latest_tag(&client, &config_for(&server)).await.unwrap();
    assert_eq!(tag, "v1.2.3");
}

#[tokio::test]
async fn token_is_sent_as_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/tool/releases/latest"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tag_name": "v2.0.0" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.github_api_token = Some("t0ken".to_string());
    let client = build_http_client().unwrap();
    assert_eq!(fetch_latest_tag(&client, &config).await.unwrap(), "v2.0.0");
}

#[tokio::test]
async fn missing_repository_is_a_metadata_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/tool/releases/latest"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = build_http_client().unwrap();
    let err = fetch_latest_tag(&client, &config_for(&server))
        .await
        .unwrap_err();
    match err {
        HinstError::MetadataFetch { repo, reason } => {
            assert_eq!(repo, "org/tool");
            assert!(reason.contains("404"), "{reason}");
        }
        other => panic!("expected MetadataFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn metadata_without_tag_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/tool/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "x" })))
        .mount(&server)
        .await;

    let client = build_http_client().unwrap();
    let err = fetch_latest_tag(&client, &config_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, HinstError::MetadataFetch { .. }), "{err:?}");
}

#[tokio::test]
async fn plain_http_is_refused_without_opt_in() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.allow_insecure_urls = false;

    let client = build_http_client().unwrap();
    let err = fetch_latest_tag(&client, &config).await.unwrap_err();
    match err {
        HinstError::MetadataFetch { reason, .. } => {
            assert!(reason.contains("Must be https"), "{reason}");
        }
        other => panic!("expected MetadataFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn pinned_tag_skips_the_metadata_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/tool/releases/latest"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.pinned_tag = Some("v0.9.0".to_string());
    let platform = PlatformTarget::new(Os::Darwin, Arch::Arm64);
    let client = build_http_client().unwrap();
    let release = resolve_release(&client, &config, &platform).await.unwrap();
    assert_eq!(release.tag, "v0.9.0");
    assert_eq!(release.archive_name, "tool-darwin-arm64.tar.xz");
    assert_eq!(
        release.archive_url,
        format!(
            "{}/org/tool/releases/download/v0.9.0/tool-darwin-arm64.tar.xz",
            server.uri()
        )
    );
}

// ── release asset downloads ───────────────────────────────────────────

#[tokio::test]
async fn download_writes_the_body_to_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/tool/releases/download/v1.2.3/tool-linux-amd64.tar.xz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("tool-linux-amd64.tar.xz");
    let url = format!(
        "{}/org/tool/releases/download/v1.2.3/tool-linux-amd64.tar.xz",
        server.uri()
    );
    let client = build_http_client().unwrap();
    let artifact = download_to_file(&client, &url, &dest, true, false)
        .await
        .unwrap();
    assert_eq!(artifact.file_name, "tool-linux-amd64.tar.xz");
    assert_eq!(artifact.size_bytes, 13);
    assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
}

#[tokio::test]
async fn failed_download_leaves_no_partial_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("tool-linux-amd64.tar.xz");
    let url = format!("{}/missing.tar.xz", server.uri());
    let client = build_http_client().unwrap();
    let err = download_to_file(&client, &url, &dest, true, false)
        .await
        .unwrap_err();
    match err {
        HinstError::Download { url: failed, reason } => {
            assert_eq!(failed, url);
            assert!(reason.contains("404"), "{reason}");
        }
        other => panic!("expected Download, got {other:?}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn plain_http_download_is_refused_as_a_download_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("tool-linux-amd64.tar.xz");
    let url = format!("{}/tool-linux-amd64.tar.xz", server.uri());
    let client = build_http_client().unwrap();
    let err = download_to_file(&client, &url, &dest, false, false)
        .await
        .unwrap_err();
    assert!(matches!(err, HinstError::Download { .. }), "{err:?}");
    assert!(!dest.exists());
}

#[tokio::test]
async fn body_shorter_than_content_length_is_a_download_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = [0u8; 4096];
        let _ = stream.read(&mut request).unwrap();
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
            .unwrap();
        stream.flush().unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("tool-linux-amd64.tar.xz");
    let url = format!("http://{addr}/tool-linux-amd64.tar.xz");
    let client = build_http_client().unwrap();
    let err = download_to_file(&client, &url, &dest, true, false)
        .await
        .unwrap_err();
    server.join().unwrap();

    match err {
        HinstError::Download { url: failed, .. } => assert_eq!(failed, url),
        other => panic!("expected Download, got {other:?}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn manifest_fetch_failure_has_its_own_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "{}/org/tool/releases/download/v1.2.3/checksums.txt",
        server.uri()
    );
    let client = build_http_client().unwrap();
    let err = fetch_checksum_manifest(&client, &url, &dir.path().join("checksums.txt"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, HinstError::ChecksumManifestFetch { .. }), "{err:?}");
}

#[tokio::test]
async fn manifest_text_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checksums.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc  tool-linux-amd64.tar.xz\n"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("checksums.txt");
    let url = format!("{}/checksums.txt", server.uri());
    let client = build_http_client().unwrap();
    let text = fetch_checksum_manifest(&client, &url, &dest, true)
        .await
        .unwrap();
    assert_eq!(text, "abc  tool-linux-amd64.tar.xz\n");
    assert!(dest.is_file());
}

#[tokio::test]
async fn plain_http_manifest_is_refused_as_a_manifest_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/checksums.txt", server.uri());
    let client = build_http_client().unwrap();
    let err = fetch_checksum_manifest(&client, &url, &dir.path().join("checksums.txt"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, HinstError::ChecksumManifestFetch { .. }), "{err:?}");
}
