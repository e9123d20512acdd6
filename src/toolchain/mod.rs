//! Compiler toolchain discovery.
//!
//! [`ToolchainResolver::resolve`] locates the cross-compiler binary without
//! touching the network. Rules, first match wins:
//!
//! 1. Explicit override (`RELFETCH_TOOLCHAIN`), if that path exists
//! 2. The legacy well-known install path, if it exists
//! 3. The executable search path (`PATH`)
//! 4. The bare command name, unresolved
//!
//! Rule 4 is not an error. Invoking the bare name later produces the
//! platform's own "command not found" diagnostic at the point of use.

pub mod platform;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::config::ToolchainConfig;
use crate::core::output;

pub use platform::{Arch, Platform};

/// Legacy install location, checked after the override.
#[cfg(windows)]
pub const LEGACY_TOOLCHAIN_PATH: &str = r"C:\zig\zig.exe";

/// Legacy install location, checked after the override.
#[cfg(not(windows))]
pub const LEGACY_TOOLCHAIN_PATH: &str = "/opt/zig/zig";

/// Which rule produced a [`ToolchainPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainSource {
    Override,
    Legacy,
    SearchPath,
    /// Nothing found; `path` is the bare command name.
    Bare,
}

/// A resolved toolchain binary for one target platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPath {
    pub platform: Platform,
    pub path: PathBuf,
    pub source: ToolchainSource,
}

impl ToolchainPath {
    /// False when resolution fell through to the bare command name.
    pub fn is_resolved(&self) -> bool {
        self.source != ToolchainSource::Bare
    }

    /// Program and arguments for a C compiler targeting `arch` on this
    /// path's platform, e.g. `zig cc -target x86_64-linux-gnu`.
    pub fn cc_command(&self, arch: Arch) -> (PathBuf, Vec<String>) {
        (
            self.path.clone(),
            vec![
                "cc".to_string(),
                "-target".to_string(),
                self.platform.zig_target(arch),
            ],
        )
    }
}

impl fmt::Display for ToolchainPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Finds the toolchain binary from injected configuration.
#[derive(Debug, Clone)]
pub struct ToolchainResolver {
    command: String,
    override_path: Option<PathBuf>,
    search_path: Option<OsString>,
    legacy_path: PathBuf,
    cwd: PathBuf,
}

impl ToolchainResolver {
    pub fn new(config: ToolchainConfig) -> Self {
        Self {
            command: config.command,
            override_path: config.override_path,
            search_path: config.search_path,
            legacy_path: PathBuf::from(LEGACY_TOOLCHAIN_PATH),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    #[cfg(test)]
    fn with_legacy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_path = path.into();
        self
    }

    /// Command name looked up on the search path, with the host's
    /// executable suffix.
    pub fn command_name(&self) -> String {
        format!("{}{}", self.command, std::env::consts::EXE_SUFFIX)
    }

    /// Resolve the toolchain for `platform`. Never fails.
    pub fn resolve(&self, platform: Platform) -> ToolchainPath {
        let found = |path: PathBuf, source| ToolchainPath {
            platform,
            path,
            source,
        };

        if let Some(path) = &self.override_path {
            if path.exists() {
                return found(path.clone(), ToolchainSource::Override);
            }
            output::warning(&format!(
                "toolchain override {} does not exist, ignoring",
                path.display()
            ));
        }

        if self.legacy_path.exists() {
            return found(self.legacy_path.clone(), ToolchainSource::Legacy);
        }

        if let Some(path) = self.search() {
            return found(path, ToolchainSource::SearchPath);
        }

        found(PathBuf::from(self.command_name()), ToolchainSource::Bare)
    }

    fn search(&self) -> Option<PathBuf> {
        let paths = self.search_path.as_ref()?;
        let path = which::which_in(self.command_name(), Some(paths), &self.cwd).ok()?;
        Some(absolutize(&self.cwd, path))
    }
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(override_path: Option<&Path>, search_path: Option<&Path>) -> ToolchainResolver {
        ToolchainResolver::new(ToolchainConfig {
            command: "zig".to_string(),
            override_path: override_path.map(Path::to_path_buf),
            search_path: search_path.map(|p| p.as_os_str().to_os_string()),
        })
        .with_legacy_path("/nonexistent/legacy/zig")
    }

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    #[test]
    fn test_override_wins_over_everything() {
        let temp = TempDir::new().unwrap();
        let override_bin = make_executable(temp.path(), "custom-zig");
        let legacy = make_executable(temp.path(), "legacy-zig");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        make_executable(&bin_dir, &format!("zig{}", std::env::consts::EXE_SUFFIX));

        let result = resolver(Some(&override_bin), Some(&bin_dir))
            .with_legacy_path(&legacy)
            .resolve(Platform::Linux);

        assert_eq!(result.path, override_bin);
        assert_eq!(result.source, ToolchainSource::Override);
        assert_eq!(result.platform, Platform::Linux);
    }

    #[test]
    fn test_missing_override_falls_through_to_legacy() {
        let temp = TempDir::new().unwrap();
        let legacy = make_executable(temp.path(), "legacy-zig");

        let result = resolver(Some(&temp.path().join("gone")), None)
            .with_legacy_path(&legacy)
            .resolve(Platform::Darwin);

        assert_eq!(result.path, legacy);
        assert_eq!(result.source, ToolchainSource::Legacy);
    }

    #[test]
    fn test_legacy_preferred_over_search_path() {
        let temp = TempDir::new().unwrap();
        let legacy = make_executable(temp.path(), "legacy-zig");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        make_executable(&bin_dir, &format!("zig{}", std::env::consts::EXE_SUFFIX));

        let result = resolver(None, Some(&bin_dir))
            .with_legacy_path(&legacy)
            .resolve(Platform::Linux);

        assert_eq!(result.source, ToolchainSource::Legacy);
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_returns_absolute_path() {
        let temp = TempDir::new().unwrap();
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        let zig = make_executable(&bin_dir, "zig");

        let result = resolver(None, Some(&bin_dir)).resolve(Platform::Linux);

        assert_eq!(result.source, ToolchainSource::SearchPath);
        assert!(result.path.is_absolute());
        assert_eq!(result.path, zig);
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_skips_non_executable() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("zig"), "not executable").unwrap();

        let result = resolver(None, Some(temp.path())).resolve(Platform::Linux);

        assert_eq!(result.source, ToolchainSource::Bare);
    }

    #[test]
    fn test_nothing_found_returns_bare_name() {
        let temp = TempDir::new().unwrap();
        let r = resolver(None, Some(temp.path()));

        let first = r.resolve(Platform::Windows);
        let second = r.resolve(Platform::Windows);

        assert_eq!(first.source, ToolchainSource::Bare);
        assert!(!first.is_resolved());
        assert_eq!(
            first.path,
            PathBuf::from(format!("zig{}", std::env::consts::EXE_SUFFIX))
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_search_path_returns_bare_name() {
        let result = resolver(None, None).resolve(Platform::Linux);
        assert_eq!(result.source, ToolchainSource::Bare);
    }

    #[test]
    fn test_cc_command() {
        let tc = ToolchainPath {
            platform: Platform::Linux,
            path: PathBuf::from("/opt/zig/zig"),
            source: ToolchainSource::Legacy,
        };
        let (program, args) = tc.cc_command(Arch::Arm64);
        assert_eq!(program, PathBuf::from("/opt/zig/zig"));
        assert_eq!(args, vec!["cc", "-target", "aarch64-linux-gnu"]);
    }
}
