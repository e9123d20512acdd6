//! External-dependency resolution for release builds
//!
//! Two jobs a multi-platform release pipeline needs before it can compile
//! anything:
//!
//! - **Toolchain discovery**: [`ToolchainResolver`] finds the
//!   cross-compiler binary through a fixed fallback chain (override, legacy
//!   path, `PATH`, bare name).
//! - **Release artifacts**: [`ReleaseClient`] reads a repository's latest
//!   release and downloads one platform asset, verifying it against the
//!   release's checksum listing before it is written into place.
//!
//! All configuration is resolved once into a [`Config`] and passed down.
//!
//! # Example
//!
//! ```no_run
//! use relfetch::{ArtifactFetcher, Config, Platform, ReleaseClient, ToolchainResolver};
//! use std::path::Path;
//!
//! let config = Config::from_env();
//!
//! let zig = ToolchainResolver::new(config.toolchain.clone()).resolve(Platform::Linux);
//! println!("compiler: {}", zig);
//!
//! let client = ReleaseClient::new(ArtifactFetcher::new(config.http));
//! client.download_latest("org", "tool", "linux", "amd64", Path::new("bin/tool"))?;
//! # Ok::<(), relfetch::Error>(())
//! ```
//!
//! # Environment Variables
//!
//! - `GITHUB_TOKEN` - Bearer token for authenticated (higher rate limit) requests
//! - `RELFETCH_TOOLCHAIN` - Explicit path to the compiler binary
//! - `RELFETCH_HTTP_TIMEOUT` - Request timeout in seconds (5-300)
//! - `RELFETCH_API_BASE` - Metadata API base URL

pub mod core;
pub mod error;
pub mod fetch;
mod internal;
pub mod release;
pub mod toolchain;

pub use crate::core::config::{Config, HttpConfig, ToolchainConfig};
pub use crate::core::output;
pub use error::{Error, Result};
pub use fetch::{ArtifactFetcher, Credential, FetchResponse, RateLimitInfo};
pub use release::{AssetDescriptor, AssetMatcher, DownloadedAsset, ReleaseClient, ReleaseInfo};
pub use toolchain::{Arch, Platform, ToolchainPath, ToolchainResolver, ToolchainSource};
