//! Process configuration
//!
//! All ambient state (credential, toolchain override, search path, HTTP
//! settings) is resolved here once and threaded into the components at
//! construction. Nothing else in the crate reads the environment.
//!
//! Precedence, lowest to highest: built-in defaults, TOML config file,
//! environment variables, command-line flags (applied by the binary).
//!
//! ```toml
//! [http]
//! timeout_secs = 60
//! api_base = "https://github.example.com/api/v3"
//! user_agent = "my-release-pipeline"
//!
//! [toolchain]
//! command = "zig"
//! ```

use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::Credential;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable naming an explicit toolchain binary.
pub const TOOLCHAIN_OVERRIDE_ENV: &str = "RELFETCH_TOOLCHAIN";

/// Environment variable overriding the request timeout (seconds).
pub const HTTP_TIMEOUT_ENV: &str = "RELFETCH_HTTP_TIMEOUT";

/// Environment variable overriding the metadata API base URL.
pub const API_BASE_ENV: &str = "RELFETCH_API_BASE";

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Timeout for asset bodies, which can be large.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Default toolchain command name (without platform extension).
pub const DEFAULT_TOOLCHAIN_COMMAND: &str = "zig";

const DEFAULT_USER_AGENT: &str = concat!("relfetch/", env!("CARGO_PKG_VERSION"));

/// Errors loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for [`crate::fetch::ArtifactFetcher`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub api_base: String,
    pub timeout: Duration,
    pub download_timeout: Duration,
    pub user_agent: String,
    pub credential: Option<Credential>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            credential: None,
        }
    }
}

impl HttpConfig {
    /// Set the request timeout, clamped to 5..=300 seconds.
    ///
    /// The download timeout never drops below the request timeout.
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.timeout = Duration::from_secs(secs.clamp(5, 300));
        self.download_timeout = self.download_timeout.max(self.timeout);
    }

    /// Set the API base URL, dropping any trailing slash.
    pub fn set_api_base(&mut self, base: &str) {
        self.api_base = base.trim_end_matches('/').to_string();
    }
}

/// Settings for [`crate::toolchain::ToolchainResolver`].
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Command name searched for on the search path (no `.exe`).
    pub command: String,
    /// Explicit override path, used only if it exists.
    pub override_path: Option<PathBuf>,
    /// Executable search path, in the platform's `PATH` format.
    pub search_path: Option<OsString>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_TOOLCHAIN_COMMAND.to_string(),
            override_path: None,
            search_path: None,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub http: HttpConfig,
    pub toolchain: ToolchainConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    http: Option<HttpToml>,
    toolchain: Option<ToolchainToml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HttpToml {
    timeout_secs: Option<u64>,
    api_base: Option<String>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ToolchainToml {
    command: Option<String>,
}

impl Config {
    /// Defaults plus the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var_os(name));
        config
    }

    /// Defaults, then the config file, then the process environment.
    ///
    /// With `path == None` the default location is tried and silently
    /// skipped when absent. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match path {
            Some(p) => config.apply_file(p)?,
            None => {
                if let Some(p) = default_config_path().filter(|p| p.is_file()) {
                    config.apply_file(&p)?;
                }
            }
        }

        config.apply_env(|name| std::env::var_os(name));
        Ok(config)
    }

    /// Merge a TOML config file into this configuration.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: ConfigToml = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(http) = parsed.http {
            if let Some(secs) = http.timeout_secs {
                self.http.set_timeout_secs(secs);
            }
            if let Some(base) = http.api_base {
                self.http.set_api_base(&base);
            }
            if let Some(agent) = http.user_agent {
                self.http.user_agent = agent;
            }
        }
        if let Some(command) = parsed.toolchain.and_then(|t| t.command) {
            self.toolchain.command = command;
        }
        Ok(())
    }

    /// Merge environment values obtained through `lookup`.
    ///
    /// Unparseable timeouts are ignored, keeping the previous value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.to_string_lossy().trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(token) = var(TOKEN_ENV) {
            self.http.credential = Credential::new(token);
        }
        if let Some(secs) = var(HTTP_TIMEOUT_ENV).and_then(|s| s.parse::<u64>().ok()) {
            self.http.set_timeout_secs(secs);
        }
        if let Some(base) = var(API_BASE_ENV) {
            self.http.set_api_base(&base);
        }
        if let Some(path) = lookup(TOOLCHAIN_OVERRIDE_ENV).filter(|v| !v.is_empty()) {
            self.toolchain.override_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("PATH") {
            self.toolchain.search_path = Some(path);
        }
    }
}

/// `<config_dir>/relfetch/config.toml`, if a config dir is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("relfetch").join("config.toml"))
}
