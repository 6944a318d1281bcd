//! Extension to extraction strategy dispatch

use crate::error::ExtractError;
use crate::pattern::ScriptPatternExtractor;
use crate::python::PythonExtractor;
use docgen_core::{ClassInfo, FunctionInfo};

/// Facts pulled out of one file's text, before they are tied to a path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFacts {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
}

pub trait SourceExtractor {
    fn extract(&self, content: &str) -> Result<ExtractedFacts, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Full parse through a tree-sitter grammar
    PythonGrammar,
    /// Regular expression scans over raw text, best effort only
    ScriptPattern,
}

const STRATEGY_TABLE: &[(&str, ExtractionStrategy)] = &[
    ("py", ExtractionStrategy::PythonGrammar),
    ("pyi", ExtractionStrategy::PythonGrammar),
    ("js", ExtractionStrategy::ScriptPattern),
    ("jsx", ExtractionStrategy::ScriptPattern),
    ("mjs", ExtractionStrategy::ScriptPattern),
    ("cjs", ExtractionStrategy::ScriptPattern),
    ("ts", ExtractionStrategy::ScriptPattern),
    ("tsx", ExtractionStrategy::ScriptPattern),
];

impl ExtractionStrategy {
    pub fn for_extension(extension: &str) -> Option<Self> {
        STRATEGY_TABLE
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, strategy)| *strategy)
    }

    pub fn extract(&self, content: &str) -> Result<ExtractedFacts, ExtractError> {
        match self {
            ExtractionStrategy::PythonGrammar => PythonExtractor.extract(content),
            ExtractionStrategy::ScriptPattern => ScriptPatternExtractor.extract(content),
        }
    }
}
