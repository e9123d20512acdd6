//! Error taxonomy for toolchain resolution and release fetching.
//!
//! Every failure inside the crate surfaces as one of these kinds, unmodified.
//! Nothing is retried or swallowed here; retry policy belongs to the caller.

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::RateLimitInfo;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or verifying release artifacts.
#[derive(Error, Debug)]
pub enum Error {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {code} from {url}")]
    HttpStatus {
        url: String,
        code: u16,
        rate_limit: RateLimitInfo,
    },

    #[error("{}", rate_limit_message(url, *status, *authenticated, rate_limit))]
    RateLimit {
        url: String,
        status: u16,
        authenticated: bool,
        rate_limit: RateLimitInfo,
    },

    #[error("invalid release metadata from {url}: {reason}")]
    MetadataParse { url: String, reason: String },

    #[error("no asset matching '{matcher}' in release {version} (available: {})", available.join(", "))]
    AssetNotFound {
        matcher: String,
        version: String,
        available: Vec<String>,
    },

    #[error("'{matcher}' matches more than one asset in release {version}: {}", matches.join(", "))]
    AmbiguousAsset {
        matcher: String,
        version: String,
        matches: Vec<String>,
    },

    #[error("no checksum for '{asset}': {reason}")]
    ChecksumMissing { asset: String, reason: String },

    #[error("{algorithm} integrity check failed for '{asset}'\n  expected: {expected}\n  got:      {actual}")]
    ChecksumMismatch {
        asset: String,
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Stable name of the error kind, for reporting by the caller.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "NetworkError",
            Self::HttpStatus { .. } => "HTTPStatusError",
            Self::RateLimit { .. } => "RateLimitError",
            Self::MetadataParse { .. } => "MetadataParseError",
            Self::AssetNotFound { .. } => "AssetNotFoundError",
            Self::AmbiguousAsset { .. } => "AmbiguousAssetError",
            Self::ChecksumMissing { .. } => "ChecksumMissingError",
            Self::ChecksumMismatch { .. } => "ChecksumMismatchError",
            Self::Filesystem { .. } => "FilesystemError",
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { code, .. } => Some(*code),
            Self::RateLimit { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

fn rate_limit_message(
    url: &str,
    status: u16,
    authenticated: bool,
    rate_limit: &RateLimitInfo,
) -> String {
    let mut msg = format!("rate limit exceeded (HTTP {}) for {}", status, url);
    if let Some(reset) = rate_limit.reset {
        msg.push_str(&format!("; resets at unix time {}", reset));
    }
    if !authenticated {
        msg.push_str("; set GITHUB_TOKEN to raise the limit");
    }
    msg
}
