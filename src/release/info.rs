//! Release metadata model and parsing.

use serde_json::Value;

use crate::error::{Error, Result};

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub name: String,
    pub url: String,
    pub size: Option<u64>,
}

/// Metadata for one published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag as published, e.g. `v1.54.0`.
    pub version: String,
    pub assets: Vec<AssetDescriptor>,
    /// Publication timestamp (RFC 3339), when the host reports one.
    pub published_at: Option<String>,
}

impl ReleaseInfo {
    /// Parse a latest-release document.
    ///
    /// Reads GitHub's `tag_name` / `assets[].browser_download_url`, falling
    /// back to plain `version` / `assets[].url`. A document without a
    /// version string or an asset array is rejected, as is any asset entry
    /// lacking a name or URL.
    pub fn parse(url: &str, body: &[u8]) -> Result<Self> {
        let invalid = |reason: String| Error::MetadataParse {
            url: url.to_string(),
            reason,
        };

        let json: Value =
            serde_json::from_slice(body).map_err(|e| invalid(format!("not JSON: {}", e)))?;

        let version = ["tag_name", "version"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| invalid("missing version (tag_name)".to_string()))?
            .to_string();

        let entries = json
            .get("assets")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("missing asset list".to_string()))?;

        let assets = entries
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let name = a
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(format!("asset {} has no name", i)))?;
                let download_url = ["browser_download_url", "url"]
                    .iter()
                    .find_map(|key| a.get(key).and_then(Value::as_str))
                    .ok_or_else(|| invalid(format!("asset '{}' has no download URL", name)))?;
                Ok(AssetDescriptor {
                    name: name.to_string(),
                    url: download_url.to_string(),
                    size: a.get("size").and_then(Value::as_u64),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let published_at = json
            .get("published_at")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            version,
            assets,
            published_at,
        })
    }

    /// Look up an asset by exact name.
    pub fn asset(&self, name: &str) -> Option<&AssetDescriptor> {
        self.assets.iter().find(|a| a.name == name)
    }

    pub fn asset_names(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.name.clone()).collect()
    }

    /// The version as semver, if it is semver-shaped after prefix stripping.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&parse_version(&self.version)).ok()
    }
}

/// Parse a version string (extract numeric version from string)
pub fn parse_version(version_str: &str) -> String {
    // Longer prefixes first to avoid partial matches
    let s = version_str;
    let s = s.strip_prefix("release-").unwrap_or(s);
    let s = s.strip_prefix("version-").unwrap_or(s);
    let s = s.strip_prefix('v').unwrap_or(s);
    s.to_string()
}
