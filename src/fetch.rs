//! Authenticated HTTP retrieval
//!
//! [`ArtifactFetcher`] issues blocking GET requests for metadata documents,
//! asset bodies and checksum listings. When a [`Credential`] was resolved at
//! startup every request carries `Authorization: Bearer <token>`; otherwise
//! requests go out anonymously. Non-2xx statuses are errors, and no retry or
//! backoff happens here.
//!
//! ## GitHub Authentication
//!
//! Set `GITHUB_TOKEN` to raise the rate limit from 60/hr to 5000/hr:
//! ```bash
//! export GITHUB_TOKEN="ghp_xxxxxxxxxxxxxxxxxxxx"
//! ```

use std::fmt;
use std::io::Read;

use crate::core::config::HttpConfig;
use crate::core::output;
use crate::error::{Error, Result};

/// Bearer token used to authenticate requests.
///
/// The token is never printed: `Debug` is redacted and there is no
/// `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Empty or whitespace-only tokens yield `None`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Rate-limit headers reported by the remote host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// `x-ratelimit-remaining`
    pub remaining: Option<u64>,
    /// `x-ratelimit-reset`, unix seconds
    pub reset: Option<u64>,
}

impl RateLimitInfo {
    fn from_header_lookup<'a>(header: impl Fn(&str) -> Option<&'a str>) -> Self {
        let parse = |name: &str| header(name).and_then(|v| v.trim().parse::<u64>().ok());
        Self {
            remaining: parse("x-ratelimit-remaining"),
            reset: parse("x-ratelimit-reset"),
        }
    }

    /// The host reported zero remaining requests.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// A successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn rate_limit(&self) -> RateLimitInfo {
        RateLimitInfo::from_header_lookup(|name| self.header(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Metadata,
    Asset,
}

/// Blocking HTTP client that attaches the credential when present.
pub struct ArtifactFetcher {
    agent: ureq::Agent,
    config: HttpConfig,
}

impl ArtifactFetcher {
    pub fn new(config: HttpConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .build();
        Self { agent, config }
    }

    /// Base URL of the metadata API.
    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    /// Whether requests carry a credential.
    pub fn is_authenticated(&self) -> bool {
        self.config.credential.is_some()
    }

    /// Fetch a metadata document (JSON `Accept`, short timeout).
    pub fn get(&self, url: &str) -> Result<FetchResponse> {
        self.fetch(url, RequestKind::Metadata)
    }

    /// Fetch a binary asset or checksum listing (long timeout, progress).
    pub fn get_asset(&self, url: &str) -> Result<FetchResponse> {
        self.fetch(url, RequestKind::Asset)
    }

    fn request(&self, url: &str, kind: RequestKind) -> ureq::Request {
        let (accept, timeout) = match kind {
            RequestKind::Metadata => ("application/vnd.github.v3+json", self.config.timeout),
            RequestKind::Asset => ("application/octet-stream", self.config.download_timeout),
        };

        let mut request = self
            .agent
            .get(url)
            .timeout(timeout)
            .set("Accept", accept);

        if let Some(credential) = &self.config.credential {
            request = request.set("Authorization", &credential.header_value());
        }

        request
    }

    fn fetch(&self, url: &str, kind: RequestKind) -> Result<FetchResponse> {
        let response = match self.request(url, kind).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                return Err(Error::HttpStatus {
                    url: url.to_string(),
                    code,
                    rate_limit: RateLimitInfo::from_header_lookup(|name| response.header(name)),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(Error::Network {
                    url: url.to_string(),
                    message: transport.to_string(),
                });
            }
        };

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_string();
                Some((name, value))
            })
            .collect();

        let content_length = response
            .header("content-length")
            .and_then(|s| s.parse::<u64>().ok());

        let body = match kind {
            RequestKind::Metadata => read_body(response.into_reader(), url, None)?,
            RequestKind::Asset => {
                let label = url.rsplit('/').next().unwrap_or(url);
                let pb = output::spinner(&format!("downloading {}", label));
                if let Some(len) = content_length {
                    output::upgrade_to_bytes(&pb, len);
                }
                let body = read_body(response.into_reader(), url, Some(&pb));
                pb.finish_and_clear();
                body?
            }
        };

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

impl fmt::Debug for ArtifactFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn read_body(
    mut reader: impl Read,
    url: &str,
    pb: Option<&indicatif::ProgressBar>,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer).map_err(|e| Error::Network {
            url: url.to_string(),
            message: format!("read error: {}", e),
        })?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buffer[..n]);
        if let Some(pb) = pb {
            pb.set_position(body.len() as u64);
        }
    }

    Ok(body)
}
