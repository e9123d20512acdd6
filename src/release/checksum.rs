//! Checksum listings and digest verification.
//!
//! ## Supported formats
//!
//! - GNU coreutils: `<hex>  <file>` and `<hex> *<file>`
//! - BSD tagged: `SHA256 (<file>) = <hex>`
//! - Bare `<hex>` line, accepted only from a per-asset companion file
//!
//! ## Supported algorithms
//!
//! SHA-256, SHA-512 and BLAKE3. The algorithm comes from the BSD tag, else
//! from the listing's file name, else from the digest length.

use std::io::Read;
use std::path::Path;

use sha2::Digest;

use super::info::{AssetDescriptor, ReleaseInfo};
use super::select::{CHECKSUM_EXTENSIONS, is_checksum_listing};
use crate::error::{Error, Result};

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub const ALL: [Self; 3] = [Self::Sha256, Self::Sha512, Self::Blake3];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Blake3 => "BLAKE3",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA256" => Some(Self::Sha256),
            "SHA512" => Some(Self::Sha512),
            "BLAKE3" | "B3" => Some(Self::Blake3),
            _ => None,
        }
    }

    /// Algorithm implied by a checksum file name, if any.
    fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("sha512") {
            Some(Self::Sha512)
        } else if lower.contains("blake3") || lower.ends_with(".b3") || lower.contains("b3sums") {
            Some(Self::Blake3)
        } else if lower.contains("sha256") {
            Some(Self::Sha256)
        } else {
            None
        }
    }

    fn from_digest_len(len: usize) -> Self {
        if len == 128 { Self::Sha512 } else { Self::Sha256 }
    }

    /// Lowercase hex digest of `bytes`.
    pub fn digest(&self, bytes: &[u8]) -> String {
        let mut hasher = self.hasher();
        hasher.update(bytes);
        hasher.finish()
    }

    fn hasher(self) -> StreamHasher {
        match self {
            Self::Sha256 => StreamHasher::Sha256(sha2::Sha256::new()),
            Self::Sha512 => StreamHasher::Sha512(sha2::Sha512::new()),
            Self::Blake3 => StreamHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

/// Incremental state for one [`HashAlgorithm`].
enum StreamHasher {
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(chunk),
            Self::Sha512(h) => h.update(chunk),
            Self::Blake3(h) => {
                h.update(chunk);
            }
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Expected digest for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    /// Lowercase hex.
    pub digest: String,
}

impl Checksum {
    /// Check `bytes` against this checksum.
    pub fn verify(&self, asset: &str, bytes: &[u8]) -> Result<()> {
        let actual = self.algorithm.digest(bytes);
        if actual != self.digest {
            return Err(Error::ChecksumMismatch {
                asset: asset.to_string(),
                algorithm: self.algorithm.name(),
                expected: self.digest.clone(),
                actual,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ChecksumEntry {
    filename: Option<String>,
    checksum: Checksum,
}

/// A parsed checksum listing.
#[derive(Debug, Clone)]
pub struct ChecksumFile {
    source: String,
    entries: Vec<ChecksumEntry>,
}

impl ChecksumFile {
    /// Parse listing text. `source` is the listing's own file name, used
    /// for algorithm hints and per-asset companion detection.
    ///
    /// Blank lines, comments and unrecognised lines are skipped.
    pub fn parse(source: &str, text: &str) -> Self {
        let hint = HashAlgorithm::from_file_name(source);
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| parse_bsd_line(line).or_else(|| parse_gnu_line(line, hint)))
            .collect();

        Self {
            source: source.to_string(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expected checksum for `asset`.
    ///
    /// Named entries match on the file's base name. A bare digest only
    /// counts when this listing is `asset`'s own companion file.
    pub fn lookup(&self, asset: &str) -> Option<&Checksum> {
        let named = self.entries.iter().find(|e| {
            e.filename
                .as_deref()
                .is_some_and(|f| base_name(f) == asset)
        });
        if let Some(entry) = named {
            return Some(&entry.checksum);
        }

        if is_companion_of(&self.source, asset) {
            return self
                .entries
                .iter()
                .find(|e| e.filename.is_none())
                .map(|e| &e.checksum);
        }

        None
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn is_companion_of(source: &str, asset: &str) -> bool {
    source
        .strip_prefix(asset)
        .is_some_and(|ext| CHECKSUM_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn is_hex_digest(s: &str) -> bool {
    matches!(s.len(), 64 | 128) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// `SHA256 (file) = hex`
fn parse_bsd_line(line: &str) -> Option<ChecksumEntry> {
    let (tag, rest) = line.split_once(" (")?;
    let (filename, digest) = rest.rsplit_once(") = ")?;
    let algorithm = HashAlgorithm::from_tag(tag.trim())?;
    let digest = digest.trim();
    if !is_hex_digest(digest) {
        return None;
    }
    Some(ChecksumEntry {
        filename: Some(filename.to_string()),
        checksum: Checksum {
            algorithm,
            digest: digest.to_ascii_lowercase(),
        },
    })
}

/// `hex  file`, `hex *file`, or bare `hex`
fn parse_gnu_line(line: &str, hint: Option<HashAlgorithm>) -> Option<ChecksumEntry> {
    let (digest, rest) = match line.split_once(char::is_whitespace) {
        Some((d, r)) => (d, r.trim_start()),
        None => (line, ""),
    };
    if !is_hex_digest(digest) {
        return None;
    }

    let filename = rest.strip_prefix('*').unwrap_or(rest);
    let filename = filename.strip_prefix("./").unwrap_or(filename);
    let filename = (!filename.is_empty()).then(|| filename.to_string());

    Some(ChecksumEntry {
        filename,
        checksum: Checksum {
            algorithm: hint.unwrap_or_else(|| HashAlgorithm::from_digest_len(digest.len())),
            digest: digest.to_ascii_lowercase(),
        },
    })
}

/// Find the checksum listing that covers `asset` in `release`.
///
/// A per-asset companion (`<asset>.sha256`, ...) wins. Otherwise exactly one
/// release-wide listing must exist.
pub fn find_checksum_asset<'a>(
    release: &'a ReleaseInfo,
    asset: &str,
) -> Result<&'a AssetDescriptor> {
    // Extension order decides between companions; case is ignored.
    let companion = CHECKSUM_EXTENSIONS.iter().find_map(|ext| {
        let wanted = format!("{}{}", asset, ext);
        release
            .assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(&wanted))
    });
    if let Some(companion) = companion {
        return Ok(companion);
    }

    let listings: Vec<&AssetDescriptor> = release
        .assets
        .iter()
        .filter(|a| a.name != asset && is_checksum_listing(&a.name))
        .collect();

    match listings.as_slice() {
        [single] => Ok(*single),
        [] => Err(Error::ChecksumMissing {
            asset: asset.to_string(),
            reason: format!("release {} publishes no checksum file", release.version),
        }),
        many => Err(Error::AmbiguousAsset {
            matcher: format!("checksum file for {}", asset),
            version: release.version.clone(),
            matches: many.iter().map(|a| a.name.clone()).collect(),
        }),
    }
}

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Digest a file with every supported algorithm in a single read.
pub fn compute_all_hashes(file: &Path) -> std::io::Result<Vec<Checksum>> {
    let mut reader = std::fs::File::open(file)?;
    let mut hashers: Vec<(HashAlgorithm, StreamHasher)> = HashAlgorithm::ALL
        .iter()
        .map(|algorithm| (*algorithm, algorithm.hasher()))
        .collect();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        for (_, hasher) in &mut hashers {
            hasher.update(&buffer[..n]);
        }
    }

    Ok(hashers
        .into_iter()
        .map(|(algorithm, hasher)| Checksum {
            algorithm,
            digest: hasher.finish(),
        })
        .collect())
}
