//! Shared fixtures for release-fetch integration tests.

#![allow(dead_code)]

use relfetch::{ArtifactFetcher, Credential, HttpConfig, ReleaseClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Payload served for every binary asset unless a test overrides it.
pub const PAYLOAD: &[u8] = b"#!/bin/sh\necho tool v1.54.0\n";

/// Client pointed at `server`, optionally authenticated.
pub fn client(server: &MockServer, token: Option<&str>) -> ReleaseClient {
    let config = HttpConfig {
        api_base: server.uri(),
        credential: token.and_then(Credential::new),
        ..HttpConfig::default()
    };
    ReleaseClient::new(ArtifactFetcher::new(config))
}

/// Serve a latest-release document for `org/repo` listing `assets`,
/// each downloadable from `/dl/<name>`.
pub async fn mount_release(server: &MockServer, version: &str, assets: &[&str]) {
    let assets: Vec<_> = assets
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "browser_download_url": format!("{}/dl/{}", server.uri(), name)
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/org/repo/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": version,
            "published_at": "2024-05-01T00:00:00Z",
            "assets": assets
        })))
        .mount(server)
        .await;
}

pub async fn mount_file(server: &MockServer, name: &str, body: impl Into<Vec<u8>>) {
    Mock::given(method("GET"))
        .and(path(format!("/dl/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into()))
        .mount(server)
        .await;
}

/// One `<sha256>  <name>` line for `bytes`.
pub fn sha256_line(bytes: &[u8], name: &str) -> String {
    format!(
        "{}  {}\n",
        relfetch::release::HashAlgorithm::Sha256.digest(bytes),
        name
    )
}
