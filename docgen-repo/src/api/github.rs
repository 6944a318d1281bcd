//! GitHub REST client, also used for Gitea and GitHub Enterprise

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use docgen_core::{
    DirectoryEntry, DocgenError, DocgenResult, EntryKind, ErrorContext, LanguageStats,
    RepositoryMetadata,
};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

use super::{create_http_client, encode_path, status_error, HostConfig, RepositoryHost};

/// GitHub-compatible host client
pub struct GitHubHost {
    client: reqwest::Client,
    config: HostConfig,
}

/// GitHub repository response
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    description: Option<String>,
    default_branch: String,
    language: Option<String>,
    topics: Option<Vec<String>>,
    size: Option<u64>,
    #[serde(default)]
    private: bool,
}

/// One row of a contents listing
#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    size: Option<u64>,
}

/// Contents response for a single file
#[derive(Debug, Deserialize)]
struct GitHubFileContent {
    content: Option<String>,
    encoding: Option<String>,
}

impl GitHubHost {
    /// Create a new client for the API at `config.base_url`
    pub fn new(config: HostConfig) -> DocgenResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created GitHub host client for {}", config.base_url);

        Ok(Self { client, config })
    }

    /// Per-request authorization and media type headers
    fn request_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(ref token) = self.config.access_token {
            if let Ok(auth_value) =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
            {
                headers.insert(reqwest::header::AUTHORIZATION, auth_value);
            }
        }

        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        headers
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// GET an endpoint; a 404 comes back as `Ok(None)`
    async fn get_optional(&self, endpoint: &str) -> DocgenResult<Option<reqwest::Response>> {
        let url = self.endpoint_url(endpoint);

        debug!("Making GitHub API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.request_headers())
            .send()
            .await
            .map_err(|e| DocgenError::HostAccess {
                message: format!("Failed to make request to {}: {}", url, e),
                status: None,
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_host").with_operation("get_request"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Not found: {}", url);
            return Ok(None);
        }

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &headers, endpoint, &body));
        }

        Ok(Some(response))
    }

    /// GET an endpoint and decode its JSON body; a 404 is `NotFound`
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, operation: &str) -> DocgenResult<T> {
        let response = self
            .get_optional(endpoint)
            .await?
            .ok_or_else(|| docgen_core::not_found_error!(endpoint, "github_host"))?;

        parse_json(response, operation).await
    }

    fn contents_endpoint(owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
        let path = encode_path(path);
        let base = format!(
            "repos/{}/{}/contents",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let endpoint = if path.is_empty() {
            base
        } else {
            format!("{}/{}", base, path)
        };
        format!("{}?ref={}", endpoint, urlencoding::encode(git_ref))
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> DocgenResult<T> {
    response.json().await.map_err(|e| DocgenError::HostAccess {
        message: format!("Failed to parse response: {}", e),
        status: None,
        source: Some(Box::new(e)),
        context: ErrorContext::new("github_host").with_operation(operation),
    })
}

/// Entry kind from the contents API `type` field
pub(crate) fn entry_kind(item_type: &str) -> Option<EntryKind> {
    match item_type {
        "file" => Some(EntryKind::File),
        "dir" => Some(EntryKind::Dir),
        "symlink" => Some(EntryKind::Symlink),
        "submodule" => Some(EntryKind::Submodule),
        _ => None,
    }
}

/// Decode base64 content from the contents API
pub(crate) fn decode_base64_content(content: &str) -> DocgenResult<Vec<u8>> {
    // GitHub wraps the payload at 60 columns
    let cleaned_content = content.replace(['\n', '\r', ' '], "");

    BASE64
        .decode(&cleaned_content)
        .map_err(|e| DocgenError::HostAccess {
            message: format!("Failed to decode base64 content: {}", e),
            status: None,
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_host").with_operation("decode_base64_content"),
        })
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    async fn get_repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> DocgenResult<RepositoryMetadata> {
        info!("Fetching repository metadata for {}/{}", owner, repo);

        let endpoint = format!(
            "repos/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let github_repo: GitHubRepository =
            self.get_json(&endpoint, "get_repository_metadata").await?;

        Ok(RepositoryMetadata {
            name: github_repo.name,
            description: github_repo.description,
            default_branch: github_repo.default_branch,
            language: github_repo.language,
            topics: github_repo.topics.unwrap_or_default(),
            size: github_repo.size,
            private: github_repo.private,
        })
    }

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> DocgenResult<Vec<DirectoryEntry>> {
        debug!("Listing {}/{}:{} at {}", owner, repo, path, git_ref);

        let endpoint = Self::contents_endpoint(owner, repo, path, git_ref);
        let listing: serde_json::Value = self.get_json(&endpoint, "list_directory").await?;

        // A file path answers with a single object instead of an array
        if !listing.is_array() {
            return Err(DocgenError::HostAccess {
                message: format!("'{}' is not a directory", path),
                status: None,
                source: None,
                context: ErrorContext::new("github_host")
                    .with_operation("list_directory")
                    .with_metadata("path", path),
            });
        }

        let items: Vec<GitHubContentItem> = serde_json::from_value(listing)?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let kind = entry_kind(&item.item_type)?;
                Some(DirectoryEntry {
                    name: item.name,
                    path: item.path,
                    kind,
                    size: item.size,
                })
            })
            .collect())
    }

    async fn get_language_statistics(
        &self,
        owner: &str,
        repo: &str,
    ) -> DocgenResult<LanguageStats> {
        debug!("Fetching language statistics for {}/{}", owner, repo);

        let endpoint = format!(
            "repos/{}/{}/languages",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let languages: HashMap<String, u64> =
            self.get_json(&endpoint, "get_language_statistics").await?;

        Ok(languages.into_iter().collect())
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> DocgenResult<Option<Vec<u8>>> {
        debug!("Fetching file content for {}/{}/{}", owner, repo, path);

        let endpoint = Self::contents_endpoint(owner, repo, path, git_ref);
        let Some(response) = self.get_optional(&endpoint).await? else {
            return Ok(None);
        };

        let file: GitHubFileContent = parse_json(response, "get_file_content").await?;

        match (file.encoding.as_deref(), file.content) {
            (Some("base64"), Some(content)) => decode_base64_content(&content).map(Some),
            (encoding, _) => {
                // Files above the inline size limit come back with encoding "none"
                debug!(
                    "No inline content for {} (encoding {:?})",
                    path, encoding
                );
                Ok(None)
            }
        }
    }
}
