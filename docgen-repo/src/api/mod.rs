//! Hosts serving repository content over a REST API
//!
//! This module provides the capability used by the crawler to read a remote
//! repository without cloning it: metadata, directory listings, file content
//! and language statistics.

use async_trait::async_trait;
use docgen_core::{
    not_found_error, validation_error, DirectoryEntry, DocgenError, DocgenResult, ErrorContext,
    HostSettings, HostType, LanguageStats, RepoCoordinates, RepositoryMetadata,
};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

pub mod github;
pub mod memory;


pub use github::GitHubHost;
pub use memory::{HostFailure, InMemoryHost};

/// Configuration for host clients
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Access token sent as a bearer credential
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: None,
            timeout_seconds: 30,
            user_agent: "docgen/0.1".to_string(),
            headers: HashMap::new(),
        }
    }
}

impl HostConfig {
    /// Create a new configuration for GitHub
    pub fn github(access_token: Option<String>) -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            access_token,
            ..Default::default()
        }
    }

    /// Create a new configuration for a Gitea instance
    pub fn gitea(base_url: &str, access_token: Option<String>) -> Self {
        Self {
            base_url: format!("{}/api/v1", base_url.trim_end_matches('/')),
            access_token,
            ..Default::default()
        }
    }

    /// Configuration for `host_type` from settings, `None` when that host is not configured
    pub fn from_settings(host_type: HostType, settings: &HostSettings) -> Option<Self> {
        let config = match host_type {
            HostType::GitHub => Self {
                base_url: settings.github_api_url.clone(),
                access_token: settings.github_token.clone(),
                ..Default::default()
            },
            HostType::Gitea => Self::gitea(
                settings.gitea_base_url.as_deref()?,
                settings.gitea_token.clone(),
            ),
            HostType::GitLab | HostType::Bitbucket => return None,
        };

        Some(Self {
            timeout_seconds: settings.timeout_seconds,
            user_agent: settings.user_agent.clone(),
            ..config
        })
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Read access to one Git hosting service
///
/// Every call is an idempotent read. Rate limiting is reported as
/// [`DocgenError::RateLimit`] and never retried here.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn get_repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> DocgenResult<RepositoryMetadata>;

    /// List one directory at `git_ref`, `path = ""` is the root
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> DocgenResult<Vec<DirectoryEntry>>;

    async fn get_language_statistics(&self, owner: &str, repo: &str)
        -> DocgenResult<LanguageStats>;

    /// Raw file bytes with the host transfer encoding removed, `None` when absent
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> DocgenResult<Option<Vec<u8>>>;
}

/// Factory for creating host clients
pub struct HostFactory;

impl HostFactory {
    /// Create a host client for the given host type
    pub fn create_host(
        host_type: HostType,
        config: HostConfig,
    ) -> DocgenResult<Arc<dyn RepositoryHost>> {
        match host_type {
            // Gitea serves the GitHub-compatible contents API under /api/v1
            HostType::GitHub | HostType::Gitea => Ok(Arc::new(GitHubHost::new(config)?)),
            HostType::GitLab | HostType::Bitbucket => Err(DocgenError::Validation {
                message: format!("Unsupported repository host: {}", host_type),
                field: Some("host_type".to_string()),
                context: ErrorContext::new("host_factory")
                    .with_operation("create_host")
                    .with_suggestion("Supported hosts: github, gitea"),
            }),
        }
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &HostConfig) -> DocgenResult<reqwest::Client> {
    let mut headers = HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            DocgenError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            DocgenError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| DocgenError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| DocgenError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Map a non-success response to the error taxonomy
pub(crate) fn status_error(
    status: StatusCode,
    headers: &HeaderMap,
    resource: &str,
    body: &str,
) -> DocgenError {
    let detail = if body.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        body.to_string()
    };

    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && header_value(headers, "x-ratelimit-remaining") == Some("0"));

    if rate_limited {
        return DocgenError::RateLimit {
            message: format!("Host rate limit reached for {}", resource),
            retry_after_ms: rate_limit_delay_ms(headers, unix_now_secs()),
            context: ErrorContext::new("api_client")
                .with_metadata("resource", resource)
                .with_suggestion("Wait for the rate limit window to reset")
                .with_suggestion("Use an access token for a higher limit"),
        };
    }

    match status {
        StatusCode::UNAUTHORIZED => DocgenError::Authentication {
            message: format!("Host rejected credentials for {}: {}", resource, detail),
            context: ErrorContext::new("api_client")
                .with_metadata("resource", resource)
                .with_suggestion("Check your access token"),
        },
        StatusCode::NOT_FOUND => not_found_error!(resource, "api_client"),
        _ => DocgenError::HostAccess {
            message: format!("HTTP {} error for {}: {}", status.as_u16(), resource, detail),
            status: Some(status.as_u16()),
            source: None,
            context: ErrorContext::new("api_client")
                .with_metadata("resource", resource)
                .with_suggestion(match status.as_u16() {
                    403 => "Check repository permissions",
                    _ => "Check network connectivity and API status",
                }),
        },
    }
}

/// Milliseconds to wait before retrying, from `retry-after` or `x-ratelimit-reset`
pub(crate) fn rate_limit_delay_ms(headers: &HeaderMap, now_secs: u64) -> Option<u64> {
    if let Some(seconds) = header_value(headers, "retry-after").and_then(|v| v.parse::<u64>().ok())
    {
        return Some(seconds.saturating_mul(1000));
    }

    header_value(headers, "x-ratelimit-reset")
        .and_then(|v| v.parse::<u64>().ok())
        .map(|reset| reset.saturating_sub(now_secs).saturating_mul(1000))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Percent-encode each segment of a slash-separated repository path
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Owner and name from a repository URL
///
/// The last two non-empty path segments are used so that URLs with a prefix
/// path (self-hosted instances under a sub path) resolve too.
pub fn parse_repository_url(repository_url: &str) -> DocgenResult<RepoCoordinates> {
    let parsed_url = Url::parse(repository_url).map_err(|e| DocgenError::Validation {
        message: format!("Invalid repository URL: {}", e),
        field: Some("url".to_string()),
        context: ErrorContext::new("repository_url")
            .with_operation("parse_repository_url")
            .with_suggestion("Ensure the URL is valid and properly formatted"),
    })?;

    let segments: Vec<&str> = parsed_url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [.., owner, name] => {
            let name = name.trim_end_matches(".git");
            if name.is_empty() {
                return Err(validation_error!(
                    "URL must contain owner and repository name",
                    "url",
                    "repository_url"
                ));
            }
            Ok(RepoCoordinates {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(validation_error!(
            "URL must contain owner and repository name",
            "url",
            "repository_url"
        )),
    }
}

/// Text of fetched content, `None` when it is not valid UTF-8
pub fn decode_utf8(bytes: Vec<u8>) -> Option<String> {
    String::from_utf8(bytes).ok()
}
