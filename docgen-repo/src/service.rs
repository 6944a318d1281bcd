//! Documentation request orchestration
//!
//! Admits the caller, analyzes the repository on the matching host and hands
//! the analysis to a [`DocumentationGenerator`].

use crate::analyzer::{AnalyzerOptions, RepositoryAnalyzer};
use crate::api::{HostConfig, HostFactory, RepositoryHost};
use docgen_core::{
    log_operation_error, retry_async, DocgenConfig, DocgenError, DocgenResult,
    DocumentationGenerator, DocumentationRequest, DocumentationResponse, ErrorContext, HostType,
    RepositoryAnalysis, RepositoryReference, RetryConfig, SlidingWindowLimiter,
};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct DocumentationService {
    hosts: HashMap<HostType, Arc<dyn RepositoryHost>>,
    generator: Arc<dyn DocumentationGenerator>,
    limiter: SlidingWindowLimiter,
    options: AnalyzerOptions,
    retry: Option<RetryConfig>,
}

impl DocumentationService {
    pub fn new(
        generator: Arc<dyn DocumentationGenerator>,
        limiter: SlidingWindowLimiter,
        options: AnalyzerOptions,
    ) -> Self {
        Self {
            hosts: HashMap::new(),
            generator,
            limiter,
            options,
            retry: None,
        }
    }

    /// Service with a client for every host the configuration covers
    pub fn from_config(
        config: &DocgenConfig,
        generator: Arc<dyn DocumentationGenerator>,
    ) -> DocgenResult<Self> {
        config.validate()?;

        let limiter = SlidingWindowLimiter::per_minute(
            config.rate_limit.requests_per_minute,
            config.rate_limit.max_tracked_callers,
        );
        let mut service = Self::new(generator, limiter, AnalyzerOptions::from(config));

        for host_type in [HostType::GitHub, HostType::Gitea] {
            if let Some(host_config) = HostConfig::from_settings(host_type, &config.host) {
                let host = HostFactory::create_host(host_type, host_config)?;
                service = service.with_host(host_type, host);
            }
        }

        Ok(service)
    }

    pub fn with_host(mut self, host_type: HostType, host: Arc<dyn RepositoryHost>) -> Self {
        self.hosts.insert(host_type, host);
        self
    }

    /// Retry recoverable analysis failures
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub async fn generate_documentation(
        &self,
        caller_id: &str,
        request: &DocumentationRequest,
    ) -> DocgenResult<DocumentationResponse> {
        self.limiter.check(caller_id).await?;

        let host_type = request.repository.host_type;
        let host = self.hosts.get(&host_type).cloned().ok_or_else(|| {
            DocgenError::Validation {
                message: format!("No host configured for {}", host_type),
                field: Some("host_type".to_string()),
                context: ErrorContext::new("documentation_service")
                    .with_operation("generate_documentation")
                    .with_suggestion("Configure credentials or a base URL for this host"),
            }
        })?;

        info!(
            caller = %caller_id,
            url = %request.repository.url,
            host = %host_type,
            "Generating documentation"
        );

        let analysis = self
            .analyze(host, request.repository.clone())
            .await
            .inspect_err(|e| {
                log_operation_error!("analyze_repository", e);
            })?;

        let response = self
            .generator
            .generate(&analysis, &request.sections)
            .await
            .map_err(generation_failure)?;

        let sections = request.sections;
        Ok(DocumentationResponse {
            readme: response.readme.filter(|_| sections.readme),
            comments: response.comments.filter(|_| sections.comments),
            architecture: response.architecture.filter(|_| sections.architecture),
            checklist: response.checklist.filter(|_| sections.checklist),
        })
    }

    async fn analyze(
        &self,
        host: Arc<dyn RepositoryHost>,
        reference: RepositoryReference,
    ) -> DocgenResult<RepositoryAnalysis> {
        let timeout_ms = self.options.timeout_ms;

        let Some(retry) = self.retry.clone() else {
            return RepositoryAnalyzer::new(host, self.options.clone())
                .analyze_with_deadline(&reference, timeout_ms)
                .await;
        };

        let options = self.options.clone();
        retry_async(
            move || {
                let analyzer = RepositoryAnalyzer::new(host.clone(), options.clone());
                let reference = reference.clone();
                async move { analyzer.analyze_with_deadline(&reference, timeout_ms).await }.boxed()
            },
            retry,
            "analyze_repository",
        )
        .await
    }
}

fn generation_failure(error: DocgenError) -> DocgenError {
    match error {
        DocgenError::Generation { .. } => error,
        other => DocgenError::Generation {
            message: other.to_string(),
            source: Some(Box::new(other)),
            context: ErrorContext::new("documentation_service").with_operation("generate"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HostFailure, InMemoryHost};
    use async_trait::async_trait;
    use docgen_core::DocumentationSections;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DocumentationGenerator for RecordingGenerator {
        async fn generate(
            &self,
            analysis: &RepositoryAnalysis,
            _sections: &DocumentationSections,
        ) -> DocgenResult<DocumentationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(docgen_core::config_error!("model unavailable", "generator"));
            }
            Ok(DocumentationResponse {
                readme: Some(format!("# {}", analysis.metadata.name)),
                comments: Some(vec![serde_json::json!({"file": "app.py"})]),
                architecture: Some("layers".to_string()),
                checklist: Some(vec!["add tests".to_string()]),
            })
        }
    }

    fn request(sections: DocumentationSections) -> DocumentationRequest {
        DocumentationRequest {
            repository: RepositoryReference::github("https://github.com/acme/demo"),
            sections,
        }
    }

    fn service(generator: Arc<RecordingGenerator>, host: InMemoryHost) -> DocumentationService {
        DocumentationService::new(
            generator,
            SlidingWindowLimiter::per_minute(2, 16),
            AnalyzerOptions::default(),
        )
        .with_host(HostType::GitHub, Arc::new(host))
    }

    fn demo_host() -> InMemoryHost {
        InMemoryHost::named("demo").with_file("app.py", "def run():\n    pass\n")
    }

    #[tokio::test]
    async fn test_only_requested_sections_are_returned() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = service(generator.clone(), demo_host());

        let sections = DocumentationSections {
            comments: false,
            checklist: false,
            ..Default::default()
        };
        let response = service
            .generate_documentation("caller", &request(sections))
            .await
            .unwrap();

        assert_eq!(response.readme.as_deref(), Some("# demo"));
        assert_eq!(response.architecture.as_deref(), Some("layers"));
        assert!(response.comments.is_none());
        assert!(response.checklist.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_caller_rate_limit() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = service(generator.clone(), demo_host());
        let request = request(DocumentationSections::default());

        assert!(service.generate_documentation("a", &request).await.is_ok());
        assert!(service.generate_documentation("a", &request).await.is_ok());
        assert!(matches!(
            service.generate_documentation("a", &request).await,
            Err(DocgenError::RateLimit { .. })
        ));
        assert!(service.generate_documentation("b", &request).await.is_ok());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_host_is_rejected() {
        let service = service(Arc::new(RecordingGenerator::default()), demo_host());
        let mut request = request(DocumentationSections::default());
        request.repository.host_type = HostType::GitLab;

        assert!(matches!(
            service.generate_documentation("caller", &request).await,
            Err(DocgenError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_generation_error() {
        let generator = Arc::new(RecordingGenerator {
            fail: true,
            ..Default::default()
        });
        let service = service(generator, demo_host());

        let result = service
            .generate_documentation("caller", &request(DocumentationSections::default()))
            .await;
        assert!(matches!(result, Err(DocgenError::Generation { .. })));
    }

    #[tokio::test]
    async fn test_recoverable_failures_are_retried() {
        let host = Arc::new(
            InMemoryHost::named("demo")
                .with_file("src/app.py", "")
                .fail_listing("src", HostFailure::Unavailable),
        );
        let generator = Arc::new(RecordingGenerator::default());
        let service = DocumentationService::new(
            generator.clone(),
            SlidingWindowLimiter::per_minute(10, 16),
            AnalyzerOptions::default(),
        )
        .with_host(HostType::GitHub, host.clone())
        .with_retry(RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 1.0,
            jitter: false,
        });

        let result = service
            .generate_documentation("caller", &request(DocumentationSections::default()))
            .await;

        assert!(matches!(result, Err(DocgenError::RepositoryAccess { .. })));
        // root and src listed once per attempt
        assert_eq!(host.listing_calls(), 6);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config_builds_configured_hosts() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = DocumentationService::from_config(&DocgenConfig::default(), generator).unwrap();

        assert!(service.hosts.contains_key(&HostType::GitHub));
        assert!(!service.hosts.contains_key(&HostType::Gitea));
    }
}
