//! Choosing exactly one asset from a release.
//!
//! Selection never guesses: zero candidates is `AssetNotFound`, more than
//! one is `AmbiguousAsset`. Checksum listings and detached signatures are
//! never candidates.

use std::fmt;

use super::info::{AssetDescriptor, ReleaseInfo};
use crate::error::{Error, Result};

/// File extensions of per-asset checksum companions.
pub const CHECKSUM_EXTENSIONS: &[&str] = &[
    ".sha256", ".sha256sum", ".sha512", ".sha512sum", ".b3", ".blake3",
];

/// Detached signature and certificate suffixes published next to assets.
pub const SIGNATURE_EXTENSIONS: &[&str] = &[".sig", ".asc", ".pem", ".cert", ".minisig"];

/// How to recognise the wanted asset by name.
#[derive(Debug, Clone)]
pub enum AssetMatcher {
    /// Name contains both tokens (case-insensitive).
    PlatformArch { platform: String, arch: String },
    /// Name matches a glob, e.g. `tool-*-linux-amd64.tar.gz`.
    Glob(glob::Pattern),
}

impl AssetMatcher {
    pub fn platform_arch(platform: &str, arch: &str) -> Self {
        Self::PlatformArch {
            platform: platform.to_ascii_lowercase(),
            arch: arch.to_ascii_lowercase(),
        }
    }

    pub fn glob(pattern: &str) -> std::result::Result<Self, glob::PatternError> {
        glob::Pattern::new(pattern).map(Self::Glob)
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::PlatformArch { platform, arch } => {
                let name = name.to_ascii_lowercase();
                name.contains(platform.as_str()) && name.contains(arch.as_str())
            }
            Self::Glob(pattern) => pattern.matches(name),
        }
    }
}

impl fmt::Display for AssetMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlatformArch { platform, arch } => write!(f, "{}/{}", platform, arch),
            Self::Glob(pattern) => write!(f, "{}", pattern.as_str()),
        }
    }
}

/// Whether `name` looks like a checksum listing rather than a payload.
pub fn is_checksum_artifact(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    CHECKSUM_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) || is_checksum_listing(&lower)
}

/// Whether `name` is a detached signature or certificate.
pub fn is_signature_artifact(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SIGNATURE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Release-wide listing names: `checksums.txt`, `SHA256SUMS`,
/// `tool_1.0_checksums.txt`, `sha256sums.txt`, ...
///
/// Signatures over a listing (`checksums.txt.sig`) are not listings.
pub(crate) fn is_checksum_listing(name: &str) -> bool {
    if is_signature_artifact(name) {
        return false;
    }
    let lower = name.to_ascii_lowercase();
    lower.contains("checksum") || lower.ends_with("sums") || lower.ends_with("sums.txt")
}

/// Select the single non-checksum asset accepted by `matcher`.
pub fn select_asset<'a>(
    release: &'a ReleaseInfo,
    matcher: &AssetMatcher,
) -> Result<&'a AssetDescriptor> {
    let candidates: Vec<&AssetDescriptor> = release
        .assets
        .iter()
        .filter(|a| !is_checksum_artifact(&a.name) && !is_signature_artifact(&a.name))
        .filter(|a| matcher.matches(&a.name))
        .collect();

    match candidates.as_slice() {
        [single] => Ok(*single),
        [] => Err(Error::AssetNotFound {
            matcher: matcher.to_string(),
            version: release.version.clone(),
            available: release.asset_names(),
        }),
        many => Err(Error::AmbiguousAsset {
            matcher: matcher.to_string(),
            version: release.version.clone(),
            matches: many.iter().map(|a| a.name.clone()).collect(),
        }),
    }
}
