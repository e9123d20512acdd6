//! Latest-release lookup and verified asset download.
//!
//! [`ReleaseClient::download_latest`] walks
//! `Start -> MetadataFetched -> AssetSelected -> AssetDownloaded ->
//! ChecksumVerified -> Written`. Any failing step aborts the walk, and
//! `dest_path` is only touched by the final atomic rename, so a failed
//! call leaves whatever was there before.

pub mod checksum;
pub mod info;
pub mod select;

use std::path::{Path, PathBuf};

use crate::core::output;
use crate::error::{Error, Result};
use crate::fetch::ArtifactFetcher;
use crate::internal::fs_utils;

pub use checksum::{Checksum, ChecksumFile, HashAlgorithm};
pub use info::{AssetDescriptor, ReleaseInfo, parse_version};
pub use select::{AssetMatcher, select_asset};

/// Outcome of a successful verified download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub version: String,
    pub asset: String,
    pub path: PathBuf,
    pub checksum: Checksum,
    pub size: u64,
}

/// Composes [`ArtifactFetcher`] calls into release operations.
#[derive(Debug)]
pub struct ReleaseClient {
    fetcher: ArtifactFetcher,
}

impl ReleaseClient {
    pub fn new(fetcher: ArtifactFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &ArtifactFetcher {
        &self.fetcher
    }

    /// Fetch and parse the latest release of `org/repo`.
    ///
    /// Any 403 or 429 from the metadata endpoint is a `RateLimit` error,
    /// since the endpoint needs no special permission otherwise.
    pub fn fetch_info(&self, org: &str, repo: &str) -> Result<ReleaseInfo> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.fetcher.api_base(),
            org,
            repo
        );
        output::detail(&format!("fetching release metadata for {}/{}", org, repo));

        let response = self
            .fetcher
            .get(&url)
            .map_err(|e| self.classify_metadata_error(e))?;

        ReleaseInfo::parse(&url, &response.body)
    }

    /// Download the latest `org/repo` asset for `platform`/`arch` to
    /// `dest_path`, verified against the release's checksum listing.
    pub fn download_latest(
        &self,
        org: &str,
        repo: &str,
        platform: &str,
        arch: &str,
        dest_path: &Path,
    ) -> Result<DownloadedAsset> {
        let matcher = AssetMatcher::platform_arch(platform, arch);
        self.download_matching(org, repo, &matcher, dest_path)
    }

    /// Like [`download_latest`](Self::download_latest) with any matcher.
    pub fn download_matching(
        &self,
        org: &str,
        repo: &str,
        matcher: &AssetMatcher,
        dest_path: &Path,
    ) -> Result<DownloadedAsset> {
        let release = self.fetch_info(org, repo)?;
        self.download_from_release(&release, matcher, dest_path)
    }

    /// Select, download, verify and place one asset of an already fetched
    /// release.
    pub fn download_from_release(
        &self,
        release: &ReleaseInfo,
        matcher: &AssetMatcher,
        dest_path: &Path,
    ) -> Result<DownloadedAsset> {
        let asset = select_asset(release, matcher)?;
        output::sub_action(&format!("{} {}", asset.name, release.version));

        let body = self
            .fetcher
            .get_asset(&asset.url)
            .map_err(|e| self.classify_download_error(e))?
            .body;
        output::detail(&format!("downloaded {} ({} bytes)", asset.name, body.len()));

        let checksum = self.expected_checksum(release, &asset.name)?;
        output::detail(&format!(
            "verifying {} of {}",
            checksum.algorithm.name().to_ascii_lowercase(),
            asset.name
        ));
        checksum.verify(&asset.name, &body)?;

        fs_utils::write_atomic(dest_path, &body)?;
        output::detail(&format!("wrote {}", dest_path.display()));

        Ok(DownloadedAsset {
            version: release.version.clone(),
            asset: asset.name.clone(),
            path: dest_path.to_path_buf(),
            checksum,
            size: body.len() as u64,
        })
    }

    /// Download the checksum listing for `asset` and find its entry.
    pub fn expected_checksum(&self, release: &ReleaseInfo, asset: &str) -> Result<Checksum> {
        let listing = checksum::find_checksum_asset(release, asset)?;
        let body = self
            .fetcher
            .get_asset(&listing.url)
            .map_err(|e| self.classify_download_error(e))?
            .body;

        let file = ChecksumFile::parse(&listing.name, &String::from_utf8_lossy(&body));
        file.lookup(asset)
            .cloned()
            .ok_or_else(|| Error::ChecksumMissing {
                asset: asset.to_string(),
                reason: format!("{} has no entry for it", listing.name),
            })
    }

    fn classify_metadata_error(&self, err: Error) -> Error {
        match err {
            Error::HttpStatus {
                url,
                code: code @ (403 | 429),
                rate_limit,
            } => Error::RateLimit {
                url,
                status: code,
                authenticated: self.fetcher.is_authenticated(),
                rate_limit,
            },
            other => other,
        }
    }

    /// Asset hosts answer 403 for plain permission problems too, so only
    /// 429 or an exhausted rate-limit header count there.
    fn classify_download_error(&self, err: Error) -> Error {
        match err {
            Error::HttpStatus {
                url,
                code,
                rate_limit,
            } if code == 429 || (code == 403 && rate_limit.is_exhausted()) => Error::RateLimit {
                url,
                status: code,
                authenticated: self.fetcher.is_authenticated(),
                rate_limit,
            },
            other => other,
        }
    }
}
