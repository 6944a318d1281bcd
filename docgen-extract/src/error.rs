use thiserror::Error;

/// Why a single file produced no structural facts
///
/// Never escapes [`crate::CodeExtractor`]; a failed file is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("grammar could not be loaded: {0}")]
    Grammar(String),

    #[error("parser produced no tree")]
    NoTree,
}
