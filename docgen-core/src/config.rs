//! Configuration management

use crate::error::{DocgenError, DocgenResult, ErrorContext};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocgenConfig {
    pub host: HostSettings,
    pub crawl: CrawlSettings,
    pub analysis: AnalysisSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub github_api_url: String,
    pub github_token: Option<String>,
    /// Base URL of a Gitea instance, without the `/api/v1` suffix
    pub gitea_base_url: Option<String>,
    pub gitea_token: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Maximum number of path segments of any discovered entry
    pub max_depth: usize,
    pub max_files: usize,
    /// Directory listings allowed in flight at once
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Source files larger than this are not fetched for extraction (bytes)
    pub max_file_size: u64,
    pub max_extracted_files: usize,
    pub max_concurrent_fetches: usize,
    /// Deadline for a whole analysis, after which it is cancelled
    pub timeout_ms: u64,
    /// Number of languages reported in the tech stack
    pub tech_stack_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub requests_per_minute: usize,
    /// Callers tracked at once before the least recently seen is evicted
    pub max_tracked_callers: usize,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            github_token: None,
            gitea_base_url: None,
            gitea_token: None,
            timeout_seconds: 30,
            user_agent: "docgen/0.1".to_string(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_files: 10_000,
            max_concurrent_requests: 8,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024,
            max_extracted_files: 500,
            max_concurrent_fetches: 8,
            timeout_ms: 120_000,
            tech_stack_size: 3,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            max_tracked_callers: 10_000,
        }
    }
}

impl DocgenConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DocgenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocgenError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DocgenConfig = toml::from_str(&content).map_err(|e| DocgenError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DocgenResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DocgenError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| DocgenError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Fill credentials and endpoints from the environment
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            self.host.github_token = Some(token);
        }
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            self.host.github_api_url = url;
        }
        if let Ok(token) = std::env::var("GITEA_TOKEN") {
            self.host.gitea_token = Some(token);
        }
        if let Ok(url) = std::env::var("GITEA_BASE_URL") {
            self.host.gitea_base_url = Some(url);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> DocgenResult<()> {
        let checks = [
            (self.crawl.max_depth == 0, "crawl.max_depth"),
            (self.crawl.max_files == 0, "crawl.max_files"),
            (
                self.crawl.max_concurrent_requests == 0,
                "crawl.max_concurrent_requests",
            ),
            (
                self.analysis.max_concurrent_fetches == 0,
                "analysis.max_concurrent_fetches",
            ),
            (self.analysis.timeout_ms == 0, "analysis.timeout_ms"),
            (self.host.timeout_seconds == 0, "host.timeout_seconds"),
            (
                self.rate_limit.requests_per_minute == 0,
                "rate_limit.requests_per_minute",
            ),
        ];

        if let Some((_, field)) = checks.iter().find(|(invalid, _)| *invalid) {
            return Err(DocgenError::Config {
                message: format!("{} must be greater than 0", field),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion(&format!("Set {} to a positive value", field)),
            });
        }

        if self.host.github_api_url.trim().is_empty() {
            return Err(DocgenError::Config {
                message: "host.github_api_url must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}
