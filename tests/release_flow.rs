//! End-to-end tests for latest-release lookup and verified downloads.

mod common;

use common::{PAYLOAD, client, mount_file, mount_release, sha256_line};
use relfetch::Error;
use tempfile::TempDir;
use wiremock::MockServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_fetch_info_then_download_latest() {
    let server = MockServer::start().await;
    mount_release(&server, "v1.54.0", &["tool-linux-amd64", "checksums.txt"]).await;
    mount_file(&server, "tool-linux-amd64", PAYLOAD).await;
    mount_file(
        &server,
        "checksums.txt",
        sha256_line(PAYLOAD, "tool-linux-amd64"),
    )
    .await;

    let client = client(&server, None);

    let info = client.fetch_info("org", "repo").unwrap();
    assert_eq!(info.version, "v1.54.0");
    assert_eq!(info.semver(), Some(semver::Version::new(1, 54, 0)));
    assert_eq!(
        info.asset_names(),
        vec!["tool-linux-amd64".to_string(), "checksums.txt".to_string()]
    );

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("tool");
    let downloaded = client
        .download_latest("org", "repo", "linux", "amd64", &dest)
        .unwrap();

    assert_eq!(downloaded.asset, "tool-linux-amd64");
    assert_eq!(std::fs::read(&dest).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_checksum_mismatch_keeps_previous_artifact() {
    let server = MockServer::start().await;
    mount_release(&server, "v1.54.0", &["tool-linux-amd64", "SHA256SUMS"]).await;
    mount_file(&server, "tool-linux-amd64", b"tampered".to_vec()).await;
    mount_file(
        &server,
        "SHA256SUMS",
        sha256_line(PAYLOAD, "tool-linux-amd64"),
    )
    .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("tool");
    std::fs::write(&dest, "previous build").unwrap();

    let err = client(&server, None)
        .download_latest("org", "repo", "linux", "amd64", &dest)
        .unwrap_err();

    match &err {
        Error::ChecksumMismatch {
            asset, algorithm, ..
        } => {
            assert_eq!(asset, "tool-linux-amd64");
            assert_eq!(*algorithm, "SHA256");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous build");
}

#[tokio::test]
async fn test_authenticated_flow_sends_bearer_everywhere() {
    let server = MockServer::start().await;
    mount_release(&server, "v2.0.0", &["tool-darwin-arm64", "checksums.txt"]).await;
    mount_file(&server, "tool-darwin-arm64", PAYLOAD).await;
    mount_file(
        &server,
        "checksums.txt",
        sha256_line(PAYLOAD, "tool-darwin-arm64"),
    )
    .await;

    let temp = TempDir::new().unwrap();
    client(&server, Some("ghp_token"))
        .download_latest("org", "repo", "darwin", "arm64", &temp.path().join("tool"))
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        let auth = request.headers.get("authorization").unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer ghp_token");
        assert!(!request.url.as_str().contains("ghp_token"));
    }
}

#[tokio::test]
async fn test_rate_limited_metadata_reports_reset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/repo/releases/latest"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1714550400"),
        )
        .mount(&server)
        .await;

    let err = client(&server, None).fetch_info("org", "repo").unwrap_err();

    assert_eq!(err.kind(), "RateLimitError");
    assert_eq!(err.status_code(), Some(403));
    let msg = err.to_string();
    assert!(msg.contains("1714550400"));
    assert!(msg.contains("GITHUB_TOKEN"));
}

#[tokio::test]
async fn test_missing_repository_is_http_status() {
    let server = MockServer::start().await;

    let temp = TempDir::new().unwrap();
    let err = client(&server, None)
        .download_latest("org", "repo", "linux", "amd64", &temp.path().join("t"))
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { code: 404, .. }));
}

#[tokio::test]
async fn test_glob_download() {
    let server = MockServer::start().await;
    mount_release(
        &server,
        "v1.54.0",
        &[
            "tool-1.54.0-linux-amd64.tar.gz",
            "tool-1.54.0-linux-amd64.zip",
            "tool_1.54.0_checksums.txt",
        ],
    )
    .await;
    mount_file(&server, "tool-1.54.0-linux-amd64.tar.gz", PAYLOAD).await;
    mount_file(
        &server,
        "tool_1.54.0_checksums.txt",
        sha256_line(PAYLOAD, "tool-1.54.0-linux-amd64.tar.gz")
            + &sha256_line(b"zip", "tool-1.54.0-linux-amd64.zip"),
    )
    .await;

    let matcher = relfetch::AssetMatcher::glob("tool-*-linux-amd64.tar.gz").unwrap();
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("tool.tar.gz");

    let downloaded = client(&server, None)
        .download_matching("org", "repo", &matcher, &dest)
        .unwrap();

    assert_eq!(downloaded.asset, "tool-1.54.0-linux-amd64.tar.gz");
    assert_eq!(std::fs::read(&dest).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_signed_release_uses_plain_listing() {
    let server = MockServer::start().await;
    mount_release(
        &server,
        "v1.54.0",
        &[
            "tool-linux-amd64",
            "checksums.txt",
            "checksums.txt.sig",
            "checksums.txt.pem",
        ],
    )
    .await;
    mount_file(&server, "tool-linux-amd64", PAYLOAD).await;
    mount_file(
        &server,
        "checksums.txt",
        sha256_line(PAYLOAD, "tool-linux-amd64"),
    )
    .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("tool");
    let downloaded = client(&server, None)
        .download_latest("org", "repo", "linux", "amd64", &dest)
        .unwrap();

    assert_eq!(downloaded.asset, "tool-linux-amd64");
    assert_eq!(std::fs::read(&dest).unwrap(), PAYLOAD);

    let requested: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert!(!requested.iter().any(|p| p.ends_with(".sig") || p.ends_with(".pem")));
}

#[cfg(unix)]
#[tokio::test]
async fn test_replacing_download_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    mount_release(&server, "v1.54.0", &["tool-linux-amd64", "checksums.txt"]).await;
    mount_file(&server, "tool-linux-amd64", PAYLOAD).await;
    mount_file(
        &server,
        "checksums.txt",
        sha256_line(PAYLOAD, "tool-linux-amd64"),
    )
    .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("tool");
    std::fs::write(&dest, "previous build").unwrap();
    std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755)).unwrap();

    client(&server, None)
        .download_latest("org", "repo", "linux", "amd64", &dest)
        .unwrap();

    let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
    assert_eq!(std::fs::read(&dest).unwrap(), PAYLOAD);
}
