//! Fixture host serving a repository held in memory

use async_trait::async_trait;
use docgen_core::{
    not_found_error, DirectoryEntry, DocgenError, DocgenResult, EntryKind, ErrorContext,
    LanguageStats, RepositoryMetadata,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::RepositoryHost;

/// Failure a fixture returns for a configured path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFailure {
    RateLimited { retry_after_ms: Option<u64> },
    Unavailable,
    Unauthorized,
    Missing,
}

impl HostFailure {
    fn to_error(&self, path: &str) -> DocgenError {
        let context = ErrorContext::new("in_memory_host").with_metadata("path", path);
        match self {
            HostFailure::RateLimited { retry_after_ms } => DocgenError::RateLimit {
                message: format!("Host rate limit reached for {}", path),
                retry_after_ms: *retry_after_ms,
                context,
            },
            HostFailure::Unavailable => DocgenError::HostAccess {
                message: format!("HTTP 503 error for {}", path),
                status: Some(503),
                source: None,
                context,
            },
            HostFailure::Unauthorized => DocgenError::Authentication {
                message: format!("Host rejected credentials for {}", path),
                context,
            },
            HostFailure::Missing => not_found_error!(path, "in_memory_host"),
        }
    }
}

#[derive(Debug, Clone)]
struct Leaf {
    kind: EntryKind,
    content: Vec<u8>,
}

/// Deterministic host built from `(path, content)` pairs
///
/// Directories are implied by file paths. Listings come back sorted by name.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    metadata: RepositoryMetadata,
    leaves: BTreeMap<String, Leaf>,
    languages: LanguageStats,
    listing_failures: HashMap<String, HostFailure>,
    content_failures: HashMap<String, HostFailure>,
    listing_calls: AtomicUsize,
    content_calls: AtomicUsize,
}

impl InMemoryHost {
    pub fn new(metadata: RepositoryMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Fixture for `name` on branch `main` with no files
    pub fn named(name: &str) -> Self {
        Self::new(RepositoryMetadata {
            name: name.to_string(),
            default_branch: "main".to_string(),
            ..Default::default()
        })
    }

    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.leaves.insert(
            normalize(path),
            Leaf {
                kind: EntryKind::File,
                content: content.into(),
            },
        );
        self
    }

    pub fn with_symlink(mut self, path: &str) -> Self {
        self.leaves.insert(
            normalize(path),
            Leaf {
                kind: EntryKind::Symlink,
                content: Vec::new(),
            },
        );
        self
    }

    pub fn with_submodule(mut self, path: &str) -> Self {
        self.leaves.insert(
            normalize(path),
            Leaf {
                kind: EntryKind::Submodule,
                content: Vec::new(),
            },
        );
        self
    }

    pub fn with_language(mut self, language: &str, weight: u64) -> Self {
        self.languages.insert(language.to_string(), weight);
        self
    }

    /// Make listing the directory at `path` fail
    pub fn fail_listing(mut self, path: &str, failure: HostFailure) -> Self {
        self.listing_failures.insert(normalize(path), failure);
        self
    }

    /// Make fetching the file at `path` fail
    pub fn fail_content(mut self, path: &str, failure: HostFailure) -> Self {
        self.content_failures.insert(normalize(path), failure);
        self
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    fn is_directory(&self, path: &str) -> bool {
        path.is_empty() || {
            let prefix = format!("{}/", path);
            self.leaves.keys().any(|leaf| leaf.starts_with(&prefix))
        }
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[async_trait]
impl RepositoryHost for InMemoryHost {
    async fn get_repository_metadata(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> DocgenResult<RepositoryMetadata> {
        Ok(self.metadata.clone())
    }

    async fn list_directory(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> DocgenResult<Vec<DirectoryEntry>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);

        let path = normalize(path);
        if let Some(failure) = self.listing_failures.get(&path) {
            return Err(failure.to_error(&path));
        }

        if self.leaves.contains_key(&path) {
            return Err(DocgenError::HostAccess {
                message: format!("'{}' is not a directory", path),
                status: None,
                source: None,
                context: ErrorContext::new("in_memory_host").with_operation("list_directory"),
            });
        }

        if !self.is_directory(&path) {
            return Err(not_found_error!(path, "in_memory_host"));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };

        let mut children: BTreeMap<String, DirectoryEntry> = BTreeMap::new();
        for (leaf_path, leaf) in self.leaves.range(prefix.clone()..) {
            let Some(rest) = leaf_path.strip_prefix(&prefix) else {
                break;
            };

            let entry = match rest.split_once('/') {
                Some((dir_name, _)) => DirectoryEntry {
                    name: dir_name.to_string(),
                    path: format!("{}{}", prefix, dir_name),
                    kind: EntryKind::Dir,
                    size: None,
                },
                None => DirectoryEntry {
                    name: rest.to_string(),
                    path: leaf_path.clone(),
                    kind: leaf.kind,
                    size: Some(leaf.content.len() as u64),
                },
            };
            children.entry(entry.name.clone()).or_insert(entry);
        }

        Ok(children.into_values().collect())
    }

    async fn get_language_statistics(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> DocgenResult<LanguageStats> {
        Ok(self.languages.clone())
    }

    async fn get_file_content(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> DocgenResult<Option<Vec<u8>>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);

        let path = normalize(path);
        if let Some(failure) = self.content_failures.get(&path) {
            return Err(failure.to_error(&path));
        }

        Ok(self
            .leaves
            .get(&path)
            .filter(|leaf| leaf.kind == EntryKind::File)
            .map(|leaf| leaf.content.clone()))
    }
}
