//! relfetch CLI - toolchain discovery and verified release downloads
//!
//! Usage:
//!   relfetch toolchain [platform]                     Resolve the compiler binary
//!   relfetch info <org/repo>                          Show the latest release
//!   relfetch assets <org/repo>                        List latest release assets
//!   relfetch download <org/repo> [-p <os>] [-a <arch>] -o <dest>
//!   relfetch download <org/repo> --pattern <glob> -o <dest>
//!   relfetch hash <file>                              Print SHA256/SHA512/BLAKE3

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use relfetch::release::checksum;
use relfetch::{
    Arch, ArtifactFetcher, AssetMatcher, Config, Platform, ReleaseClient, ToolchainResolver,
    ToolchainSource, output,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "relfetch")]
#[command(about = "Resolve the build toolchain and fetch checksum-verified release artifacts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <config dir>/relfetch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Metadata API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the compiler toolchain for a target platform
    Toolchain {
        /// Target platform (linux, darwin, windows); defaults to the host
        platform: Option<Platform>,

        /// Also print the `cc` invocation for this architecture
        #[arg(short, long)]
        arch: Option<Arch>,
    },

    /// Show the latest release of a repository
    Info {
        /// Repository as org/repo
        repo: String,
    },

    /// List the assets of the latest release
    Assets {
        /// Repository as org/repo
        repo: String,
    },

    /// Download and verify one asset of the latest release
    Download {
        /// Repository as org/repo
        repo: String,

        /// Target platform token in the asset name; defaults to the host
        #[arg(short, long)]
        platform: Option<String>,

        /// Target architecture token in the asset name; defaults to the host
        #[arg(short, long)]
        arch: Option<String>,

        /// Glob over asset names, instead of --platform/--arch
        #[arg(long, conflicts_with_all = ["platform", "arch"])]
        pattern: Option<String>,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print SHA256, SHA512 and BLAKE3 of a file
    Hash {
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<relfetch::Error>() {
                Some(e) => output::error(&format!("[{}] {:#}", e.kind(), err)),
                None => output::error(&format!("{:#}", err)),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(base) = &cli.api_base {
        config.http.set_api_base(base);
    }
    if let Some(secs) = cli.timeout {
        config.http.set_timeout_secs(secs);
    }

    match cli.command {
        Commands::Toolchain { platform, arch } => {
            let platform = match platform {
                Some(p) => p,
                None => Platform::host().context("unsupported host platform; pass one")?,
            };
            let resolver = ToolchainResolver::new(config.toolchain);
            let toolchain = resolver.resolve(platform);

            let source = match toolchain.source {
                ToolchainSource::Override => "override",
                ToolchainSource::Legacy => "legacy path",
                ToolchainSource::SearchPath => "PATH",
                ToolchainSource::Bare => "unresolved",
            };
            output::info(&format!("{} ({})", toolchain, source.dimmed()));

            if let Some(arch) = arch {
                let (program, args) = toolchain.cc_command(arch);
                println!("{} {}", program.display(), args.join(" "));
            }
        }

        Commands::Info { repo } => {
            let (org, name) = split_repo(&repo)?;
            let client = ReleaseClient::new(ArtifactFetcher::new(config.http));
            let info = client
                .fetch_info(org, name)
                .with_context(|| format!("fetching latest release of {}", repo))?;

            output::info(&format!("{} {}", repo.bold(), info.version));
            if let Some(published) = &info.published_at {
                output::list_item("published", published);
            }
            if let Some(version) = info.semver() {
                output::list_item("semver", &version.to_string());
            }
            output::list_item("assets", &info.assets.len().to_string());
        }

        Commands::Assets { repo } => {
            let (org, name) = split_repo(&repo)?;
            let client = ReleaseClient::new(ArtifactFetcher::new(config.http));
            let info = client
                .fetch_info(org, name)
                .with_context(|| format!("fetching latest release of {}", repo))?;

            output::info(&format!("{} {}", repo.bold(), info.version));
            for asset in &info.assets {
                output::list_item(&asset.name, &asset.url);
            }
        }

        Commands::Download {
            repo,
            platform,
            arch,
            pattern,
            output: dest,
        } => {
            let (org, name) = split_repo(&repo)?;
            let matcher = match pattern {
                Some(p) => AssetMatcher::glob(&p)
                    .with_context(|| format!("invalid asset pattern '{}'", p))?,
                None => {
                    let (platform, arch) = target_tokens(platform, arch)?;
                    AssetMatcher::platform_arch(&platform, &arch)
                }
            };

            output::action(&format!("Downloading {} ({})", repo, matcher));
            let client = ReleaseClient::new(ArtifactFetcher::new(config.http));
            let downloaded = client
                .download_matching(org, name, &matcher, &dest)
                .with_context(|| format!("downloading latest {} asset of {}", matcher, repo))?;

            output::success(&format!(
                "{} {} -> {} ({} verified)",
                downloaded.asset,
                downloaded.version,
                downloaded.path.display(),
                downloaded.checksum.algorithm.name()
            ));
        }

        Commands::Hash { file } => {
            let hashes = checksum::compute_all_hashes(&file)
                .with_context(|| format!("hashing {}", file.display()))?;
            for checksum in &hashes {
                output::list_item(&checksum.algorithm.name().to_ascii_lowercase(), &checksum.digest);
            }
        }
    }

    Ok(())
}

/// Asset-name tokens for a download, filling gaps from the host.
fn target_tokens(platform: Option<String>, arch: Option<String>) -> Result<(String, String)> {
    let platform = match platform {
        Some(p) => p,
        None => match Platform::host() {
            Some(host) => host.to_string(),
            None => bail!("unsupported host platform; pass --platform"),
        },
    };
    let arch = match arch {
        Some(a) => a,
        None => match Arch::host() {
            Some(host) => host.to_string(),
            None => bail!("unsupported host architecture; pass --arch"),
        },
    };
    Ok((platform, arch))
}

/// Split `org/repo`, rejecting anything that would alter the API path.
fn split_repo(repo: &str) -> Result<(&str, &str)> {
    let valid = |s: &str| {
        !s.is_empty()
            && s != "."
            && s != ".."
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };

    match repo.split_once('/') {
        Some((org, name)) if valid(org) && valid(name) => Ok((org, name)),
        _ => bail!("invalid repository '{}': expected org/repo", repo),
    }
}
