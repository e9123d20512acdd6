//! Target platform and architecture.
//!
//! Names follow the release-asset convention (`linux`, `darwin`, `windows`;
//! `amd64`, `arm64`, `386`). Common aliases are accepted when parsing.

use std::fmt;
use std::str::FromStr;

/// Operating system of a build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

/// CPU architecture of a build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
    X86,
}

impl Platform {
    /// Platform this binary was compiled for, if supported.
    pub fn host() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::Darwin),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    /// Name used in release asset file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Target triple understood by `zig cc -target`.
    pub fn zig_target(self, arch: Arch) -> String {
        let cpu = match arch {
            Arch::Amd64 => "x86_64",
            Arch::Arm64 => "aarch64",
            Arch::X86 => "x86",
        };
        match self {
            Self::Linux => format!("{}-linux-gnu", cpu),
            Self::Darwin => format!("{}-macos", cpu),
            Self::Windows => format!("{}-windows-gnu", cpu),
        }
    }
}

impl Arch {
    /// Architecture this binary was compiled for, if supported.
    pub fn host() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Some(Self::Amd64),
            "aarch64" => Some(Self::Arm64),
            "x86" => Some(Self::X86),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::X86 => "386",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" | "osx" => Ok(Self::Darwin),
            "windows" | "win" | "win32" => Ok(Self::Windows),
            other => Err(format!(
                "unsupported platform '{}' (expected linux, darwin or windows)",
                other
            )),
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "386" | "x86" | "i386" | "i686" => Ok(Self::X86),
            other => Err(format!(
                "unsupported architecture '{}' (expected amd64, arm64 or 386)",
                other
            )),
        }
    }
}
