//! Docgen Extract - Static structural extraction from source files
//!
//! Picks an extraction strategy from the file extension and turns raw source
//! text into functions, classes and imports. A file that cannot be extracted
//! is skipped; nothing here fails an analysis.

pub mod error;
pub mod pattern;
pub mod python;
pub mod strategy;

pub use error::ExtractError;
pub use pattern::ScriptPatternExtractor;
pub use python::PythonExtractor;
pub use strategy::{ExtractedFacts, ExtractionStrategy, SourceExtractor};

use docgen_core::{FileInfo, ParsedFile};
use tracing::{debug, warn};

/// Entry point used by the analyzer for every fetched source file
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeExtractor;

impl CodeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Whether some strategy handles this file's extension
    pub fn supports(&self, file: &FileInfo) -> bool {
        Self::strategy_for(file).is_some()
    }

    /// Extract one file, `None` when it has no content, no strategy or fails
    pub fn extract_file(&self, file: &FileInfo) -> Option<ParsedFile> {
        let Some(content) = file.content.as_deref() else {
            debug!(path = %file.path, "No content loaded, skipping extraction");
            return None;
        };

        let strategy = Self::strategy_for(file)?;

        match strategy.extract(content) {
            Ok(facts) => {
                debug!(
                    path = %file.path,
                    functions = facts.functions.len(),
                    classes = facts.classes.len(),
                    imports = facts.imports.len(),
                    "Extracted source file"
                );
                Some(ParsedFile {
                    name: file.name.clone(),
                    path: file.path.clone(),
                    functions: facts.functions,
                    classes: facts.classes,
                    imports: facts.imports,
                })
            }
            Err(e) => {
                warn!(path = %file.path, error = %e, "Skipping file that failed extraction");
                None
            }
        }
    }

    /// Extract every file that yields facts, preserving input order
    pub fn extract_all<'a, I>(&self, files: I) -> Vec<ParsedFile>
    where
        I: IntoIterator<Item = &'a FileInfo>,
    {
        files
            .into_iter()
            .filter_map(|file| self.extract_file(file))
            .collect()
    }

    fn strategy_for(file: &FileInfo) -> Option<ExtractionStrategy> {
        file.extension
            .as_deref()
            .and_then(ExtractionStrategy::for_extension)
    }
}
