//! Tree walk over a host's directory listings
//!
//! Listings of sibling directories run concurrently up to a fixed bound. All
//! of them are polled on the caller's task, so dropping the walk drops every
//! request still in flight. Any failure aborts the whole walk.

use crate::api::RepositoryHost;
use crate::classifier::{classify, extension_of, language_for_extension};
use docgen_core::{
    path_depth, CrawlSettings, DirectoryEntry, DocgenError, DocgenResult, EntryKind,
    ErrorContext, FileCategory, FileInfo, FileKind, RepoCoordinates, RepositoryStructure,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// Bounds protecting the walk against huge or cyclic trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Maximum number of path segments of any entry
    pub max_depth: usize,
    pub max_files: usize,
    pub max_concurrent_requests: usize,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_files: 10_000,
            max_concurrent_requests: 8,
        }
    }
}

impl From<&CrawlSettings> for CrawlLimits {
    fn from(settings: &CrawlSettings) -> Self {
        Self {
            max_depth: settings.max_depth,
            max_files: settings.max_files,
            max_concurrent_requests: settings.max_concurrent_requests,
        }
    }
}

pub struct TreeWalker {
    host: Arc<dyn RepositoryHost>,
    limits: CrawlLimits,
}

impl TreeWalker {
    pub fn new(host: Arc<dyn RepositoryHost>, limits: CrawlLimits) -> Self {
        Self { host, limits }
    }

    /// Enumerate every file and directory reachable from the root at `git_ref`
    pub async fn walk(
        &self,
        coords: &RepoCoordinates,
        git_ref: &str,
    ) -> DocgenResult<RepositoryStructure> {
        let host = &self.host;
        let owner = coords.owner.as_str();
        let repo = coords.name.as_str();
        let max_in_flight = self.limits.max_concurrent_requests.max(1);

        let mut structure = RepositoryStructure::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: VecDeque<String> = VecDeque::from([String::new()]);
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < max_in_flight {
                let Some(path) = pending.pop_front() else {
                    break;
                };
                in_flight.push(async move {
                    let listing = host.list_directory(owner, repo, &path, git_ref).await;
                    (path, listing)
                });
            }

            let Some((path, listing)) = in_flight.next().await else {
                break;
            };

            let entries = listing.map_err(|e| listing_failure(&path, e))?;
            debug!(path = %path, entries = entries.len(), "Listed directory");

            for entry in entries {
                if !seen.insert(entry.path.clone()) {
                    debug!(path = %entry.path, "Skipping already visited path");
                    continue;
                }

                let depth = path_depth(&entry.path);
                if depth > self.limits.max_depth {
                    return Err(limit_exceeded("max_depth", depth, &entry.path));
                }

                match entry.kind {
                    EntryKind::Dir => {
                        pending.push_back(entry.path.clone());
                        structure.directories.push(directory_info(entry));
                    }
                    EntryKind::File => {
                        let count = structure.files.len() + 1;
                        if count > self.limits.max_files {
                            return Err(limit_exceeded("max_files", count, &entry.path));
                        }
                        add_file(&mut structure, file_info(entry));
                    }
                    EntryKind::Symlink | EntryKind::Submodule => {
                        debug!(path = %entry.path, kind = ?entry.kind, "Not following link");
                    }
                }
            }
        }

        sort_by_path(&mut structure);

        info!(
            owner = %owner,
            repo = %repo,
            files = structure.files.len(),
            directories = structure.directories.len(),
            "Repository tree walked"
        );

        Ok(structure)
    }
}

fn listing_failure(path: &str, error: DocgenError) -> DocgenError {
    match error {
        DocgenError::RateLimit { .. } => error,
        other => DocgenError::RepositoryAccess {
            path: path.to_string(),
            message: other.to_string(),
            source: Some(Box::new(other)),
            context: ErrorContext::new("tree_walker")
                .with_operation("list_directory")
                .with_metadata("path", path),
        },
    }
}

fn limit_exceeded(limit: &str, value: usize, path: &str) -> DocgenError {
    DocgenError::ResourceLimitExceeded {
        limit: limit.to_string(),
        value,
        context: ErrorContext::new("tree_walker")
            .with_operation("walk")
            .with_metadata("path", path)
            .with_suggestion("Raise the crawl limits or analyze a smaller repository"),
    }
}

fn directory_info(entry: DirectoryEntry) -> FileInfo {
    FileInfo {
        name: entry.name,
        path: entry.path,
        kind: FileKind::Directory,
        size: None,
        extension: None,
        language: None,
        content: None,
    }
}

fn file_info(entry: DirectoryEntry) -> FileInfo {
    let extension = extension_of(&entry.name);
    let language = extension
        .as_deref()
        .and_then(language_for_extension)
        .map(str::to_string);

    FileInfo {
        name: entry.name,
        path: entry.path,
        kind: FileKind::File,
        size: entry.size,
        extension,
        language,
        content: None,
    }
}

fn add_file(structure: &mut RepositoryStructure, file: FileInfo) {
    match classify(&file.name) {
        Some(FileCategory::Main) => structure.main_files.push(file.clone()),
        Some(FileCategory::Source) => structure.source_files.push(file.clone()),
        Some(FileCategory::Config) => structure.config_files.push(file.clone()),
        None => {}
    }
    structure.files.push(file);
}

/// Completion order of listings is arbitrary; results are ordered by path
fn sort_by_path(structure: &mut RepositoryStructure) {
    for bucket in [
        &mut structure.files,
        &mut structure.directories,
        &mut structure.main_files,
        &mut structure.source_files,
        &mut structure.config_files,
    ] {
        bucket.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HostFailure, InMemoryHost};

    fn coords() -> RepoCoordinates {
        RepoCoordinates {
            owner: "acme".to_string(),
            name: "demo".to_string(),
        }
    }

    fn paths(files: &[FileInfo]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_walk_classifies_files() {
        let host = InMemoryHost::named("demo")
            .with_file("README.md", "# demo")
            .with_file("requirements.txt", "flask")
            .with_file("app/main.py", "print('hi')")
            .with_file("app/static/logo.png", "")
            .with_file("config/settings.yml", "a: 1")
            .with_symlink("app/current")
            .with_submodule("vendor/lib");

        let walker = TreeWalker::new(Arc::new(host), CrawlLimits::default());
        let structure = walker.walk(&coords(), "main").await.unwrap();

        assert_eq!(
            paths(&structure.files),
            vec![
                "README.md",
                "app/main.py",
                "app/static/logo.png",
                "config/settings.yml",
                "requirements.txt",
            ]
        );
        assert_eq!(
            paths(&structure.directories),
            vec!["app", "app/static", "config", "vendor"]
        );
        assert_eq!(paths(&structure.main_files), vec!["README.md", "requirements.txt"]);
        assert_eq!(paths(&structure.source_files), vec!["app/main.py"]);
        assert_eq!(paths(&structure.config_files), vec!["config/settings.yml"]);

        let main_py = &structure.source_files[0];
        assert_eq!(main_py.extension.as_deref(), Some("py"));
        assert_eq!(main_py.language.as_deref(), Some("Python"));
        assert!(main_py.content.is_none());
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let walker = TreeWalker::new(Arc::new(InMemoryHost::named("empty")), CrawlLimits::default());
        let structure = walker.walk(&coords(), "main").await.unwrap();
        assert!(structure.is_empty());
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let host = InMemoryHost::named("deep").with_file("a/b/c/d.py", "");
        let limits = CrawlLimits {
            max_depth: 3,
            ..Default::default()
        };

        let result = TreeWalker::new(Arc::new(host), limits).walk(&coords(), "main").await;
        match result {
            Err(DocgenError::ResourceLimitExceeded { limit, value, .. }) => {
                assert_eq!(limit, "max_depth");
                assert_eq!(value, 4);
            }
            other => panic!("expected depth limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_limit() {
        let host = InMemoryHost::named("wide")
            .with_file("a.py", "")
            .with_file("b.py", "")
            .with_file("c.py", "");
        let limits = CrawlLimits {
            max_files: 2,
            ..Default::default()
        };

        let result = TreeWalker::new(Arc::new(host), limits).walk(&coords(), "main").await;
        assert!(matches!(
            result,
            Err(DocgenError::ResourceLimitExceeded { value: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_walk() {
        let host = InMemoryHost::named("broken")
            .with_file("ok/a.py", "")
            .with_file("bad/b.py", "")
            .fail_listing("bad", HostFailure::Unavailable);

        let result = TreeWalker::new(Arc::new(host), CrawlLimits::default())
            .walk(&coords(), "main")
            .await;

        match result {
            Err(error @ DocgenError::RepositoryAccess { .. }) => {
                assert!(error.is_recoverable());
                if let DocgenError::RepositoryAccess { path, .. } = error {
                    assert_eq!(path, "bad");
                }
            }
            other => panic!("expected repository access error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_unchanged() {
        let host = InMemoryHost::named("limited")
            .with_file("src/a.py", "")
            .fail_listing("src", HostFailure::RateLimited { retry_after_ms: None });

        let result = TreeWalker::new(Arc::new(host), CrawlLimits::default())
            .walk(&coords(), "main")
            .await;
        assert!(matches!(result, Err(DocgenError::RateLimit { .. })));
    }

    #[tokio::test]
    async fn test_single_request_in_flight() {
        let host = Arc::new(
            InMemoryHost::named("serial")
                .with_file("a/x.py", "")
                .with_file("b/y.py", "")
                .with_file("c/z.py", ""),
        );
        let limits = CrawlLimits {
            max_concurrent_requests: 1,
            ..Default::default()
        };

        let structure = TreeWalker::new(host.clone(), limits)
            .walk(&coords(), "main")
            .await
            .unwrap();
        assert_eq!(structure.files.len(), 3);
        assert_eq!(host.listing_calls(), 4);
    }
}
