//! Repository analysis pipeline
//!
//! Walks the tree, then resolves dependencies, extracts source facts and
//! profiles the project. Only the walk and the metadata lookups are fatal;
//! dependency resolution and extraction are best-effort per item.

use crate::api::{decode_utf8, parse_repository_url, RepositoryHost};
use crate::dependencies::DependencyResolver;
use crate::profiler::ProjectProfiler;
use crate::walker::{CrawlLimits, TreeWalker};
use docgen_core::{
    log_operation_start, log_operation_success, performance, process_concurrently,
    with_timeout, DocgenConfig, DocgenResult, FileInfo, ParsedFile, RepoCoordinates,
    RepositoryAnalysis, RepositoryReference, RepositoryStructure,
};
use docgen_extract::CodeExtractor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tunables for one analysis
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub crawl: CrawlLimits,
    /// Source files above this size in bytes are not fetched
    pub max_file_size: u64,
    pub max_extracted_files: usize,
    pub max_concurrent_fetches: usize,
    pub timeout_ms: u64,
    pub tech_stack_size: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self::from(&DocgenConfig::default())
    }
}

impl From<&DocgenConfig> for AnalyzerOptions {
    fn from(config: &DocgenConfig) -> Self {
        Self {
            crawl: CrawlLimits::from(&config.crawl),
            max_file_size: config.analysis.max_file_size,
            max_extracted_files: config.analysis.max_extracted_files,
            max_concurrent_fetches: config.analysis.max_concurrent_fetches,
            timeout_ms: config.analysis.timeout_ms,
            tech_stack_size: config.analysis.tech_stack_size,
        }
    }
}

pub struct RepositoryAnalyzer {
    host: Arc<dyn RepositoryHost>,
    options: AnalyzerOptions,
    extractor: CodeExtractor,
}

impl RepositoryAnalyzer {
    pub fn new(host: Arc<dyn RepositoryHost>, options: AnalyzerOptions) -> Self {
        Self {
            host,
            options,
            extractor: CodeExtractor::new(),
        }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze the repository behind `reference`
    pub async fn analyze(&self, reference: &RepositoryReference) -> DocgenResult<RepositoryAnalysis> {
        let coords = parse_repository_url(&reference.url)?;
        log_operation_start!("analyze_repository", repository = %coords);

        let metadata = self
            .host
            .get_repository_metadata(&coords.owner, &coords.name)
            .await?;
        let branch = reference
            .branch
            .clone()
            .unwrap_or_else(|| metadata.default_branch.clone());

        let walker = TreeWalker::new(self.host.clone(), self.options.crawl);
        let structure =
            performance::measure_async("walk_tree", walker.walk(&coords, &branch)).await?;

        let languages = self
            .host
            .get_language_statistics(&coords.owner, &coords.name)
            .await?;

        let dependencies =
            DependencyResolver::new(self.host.clone(), self.options.max_concurrent_fetches)
                .resolve(&coords, &branch, &structure)
                .await;

        let parsed_files = self.extract_sources(&coords, &branch, &structure).await;

        let profile = ProjectProfiler::new(self.options.tech_stack_size).profile(&structure, &languages);

        log_operation_success!(
            "analyze_repository",
            repository = %coords,
            files = structure.files.len(),
            parsed = parsed_files.len(),
            complexity = profile.complexity_score
        );

        Ok(RepositoryAnalysis {
            reference: reference.clone(),
            coordinates: coords,
            branch,
            metadata,
            structure,
            languages,
            dependencies,
            project_type: profile.project_type,
            tech_stack: profile.tech_stack,
            complexity_score: profile.complexity_score,
            parsed_files,
        })
    }

    /// Analyze under a deadline; on expiry every pending host call is dropped
    pub async fn analyze_with_deadline(
        &self,
        reference: &RepositoryReference,
        timeout_ms: u64,
    ) -> DocgenResult<RepositoryAnalysis> {
        with_timeout(self.analyze(reference), timeout_ms, "analyze_repository").await?
    }

    /// Fetch and extract the source files a strategy exists for
    async fn extract_sources(
        &self,
        coords: &RepoCoordinates,
        git_ref: &str,
        structure: &RepositoryStructure,
    ) -> Vec<ParsedFile> {
        let max_file_size = self.options.max_file_size;
        let candidates: Vec<FileInfo> = structure
            .source_files
            .iter()
            .filter(|file| self.extractor.supports(file))
            .filter(|file| file.size.map_or(true, |size| size <= max_file_size))
            .take(self.options.max_extracted_files)
            .cloned()
            .collect();

        debug!(candidates = candidates.len(), "Fetching sources for extraction");

        let mut fetched: Vec<FileInfo> = process_concurrently(
            candidates,
            self.options.max_concurrent_fetches,
            |file| async move { self.fetch_source(coords, git_ref, file).await },
        )
        .await
        .into_iter()
        .flatten()
        .collect();
        fetched.sort_by(|a, b| a.path.cmp(&b.path));

        performance::measure_sync("extract_sources", || self.extractor.extract_all(&fetched))
    }

    async fn fetch_source(
        &self,
        coords: &RepoCoordinates,
        git_ref: &str,
        file: FileInfo,
    ) -> Option<FileInfo> {
        let bytes = match self
            .host
            .get_file_content(&coords.owner, &coords.name, &file.path, git_ref)
            .await
        {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(path = %file.path, error = %e, "Failed to fetch source file");
                return None;
            }
        };

        let Some(content) = decode_utf8(bytes) else {
            debug!(path = %file.path, "Source file is not valid UTF-8");
            return None;
        };

        Some(file.with_content(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HostFailure, InMemoryHost};
    use docgen_core::{DocgenError, ProjectType};

    fn reference() -> RepositoryReference {
        RepositoryReference::github("https://github.com/acme/demo")
    }

    #[tokio::test]
    async fn test_analyze_small_repository() {
        let host = InMemoryHost::named("demo")
            .with_file("requirements.txt", "requests==2.28.0\n# comment\nflask")
            .with_file("app/main.py", "import os\n\ndef main():\n    \"\"\"Entry.\"\"\"\n")
            .with_file("app/broken.py", "def broken(:\n")
            .with_file("assets/logo.bin", vec![0u8, 159, 146, 150])
            .with_language("Python", 1200);

        let analyzer = RepositoryAnalyzer::new(Arc::new(host), AnalyzerOptions::default());
        let analysis = analyzer.analyze(&reference()).await.unwrap();

        assert_eq!(analysis.branch, "main");
        assert_eq!(analysis.coordinates.to_string(), "acme/demo");
        assert_eq!(analysis.project_type, Some(ProjectType::Python));
        assert_eq!(analysis.tech_stack, vec!["Python"]);
        assert_eq!(
            analysis.dependencies[&docgen_core::Ecosystem::Python],
            vec!["requests", "flask"]
        );

        let parsed: Vec<&str> = analysis.parsed_files.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(parsed, vec!["app/main.py"]);
        assert_eq!(
            analysis.parsed_files[0].functions[0].docstring.as_deref(),
            Some("Entry.")
        );
    }

    #[tokio::test]
    async fn test_explicit_branch_and_size_cap() {
        let host = InMemoryHost::named("demo")
            .with_file("small.py", "def a():\n    pass\n")
            .with_file("large.py", format!("x = '{}'\n", "y".repeat(64)));
        let host = Arc::new(host);

        let options = AnalyzerOptions {
            max_file_size: 32,
            ..Default::default()
        };
        let analyzer = RepositoryAnalyzer::new(host.clone(), options);
        let analysis = analyzer
            .analyze(&reference().with_branch("release"))
            .await
            .unwrap();

        assert_eq!(analysis.branch, "release");
        assert_eq!(analysis.parsed_files.len(), 1);
        assert_eq!(analysis.parsed_files[0].path, "small.py");
        assert_eq!(host.content_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_network() {
        let host = Arc::new(InMemoryHost::named("demo"));
        let analyzer = RepositoryAnalyzer::new(host.clone(), AnalyzerOptions::default());

        let result = analyzer
            .analyze(&RepositoryReference::github("https://github.com/"))
            .await;
        assert!(matches!(result, Err(DocgenError::Validation { .. })));
        assert_eq!(host.listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_content_failure_is_not_fatal() {
        let host = InMemoryHost::named("demo")
            .with_file("a.py", "def a():\n    pass\n")
            .with_file("b.py", "def b():\n    pass\n")
            .fail_content("a.py", HostFailure::Unavailable);

        let analyzer = RepositoryAnalyzer::new(Arc::new(host), AnalyzerOptions::default());
        let analysis = analyzer.analyze(&reference()).await.unwrap();

        assert_eq!(analysis.parsed_files.len(), 1);
        assert_eq!(analysis.parsed_files[0].path, "b.py");
    }
    #[tokio::test]
    async fn test_deadline_analysis_runs_as_boxed_send_future() {
        use futures::future::{BoxFuture, FutureExt};

        let host = InMemoryHost::named("demo")
            .with_file("package.json", r#"{"dependencies":{"react":"18"}}"#)
            .with_file("src/app.js", "function start(root) { mount(root); }\n");
        let analyzer = RepositoryAnalyzer::new(Arc::new(host), AnalyzerOptions::default());
        let reference = reference();

        let analysis: BoxFuture<'static, DocgenResult<RepositoryAnalysis>> =
            async move { analyzer.analyze_with_deadline(&reference, 5_000).await }.boxed();
        let analysis = analysis.await.unwrap();

        assert_eq!(analysis.parsed_files.len(), 1);
        assert_eq!(analysis.parsed_files[0].functions[0].name, "start");
        assert_eq!(
            analysis.dependencies[&docgen_core::Ecosystem::Node],
            vec!["react"]
        );
    }
}
