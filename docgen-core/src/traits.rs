//! Core trait definitions

use crate::error::DocgenResult;
use crate::types::*;
use async_trait::async_trait;

/// Turns a structural summary into documentation text
///
/// Implementations wrap a text generation service. The analysis core only
/// hands over the summary and the requested sections.
#[async_trait]
pub trait DocumentationGenerator: Send + Sync {
    async fn generate(
        &self,
        analysis: &RepositoryAnalysis,
        sections: &DocumentationSections,
    ) -> DocgenResult<DocumentationResponse>;
}
