use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("no page image was generated for {0}")]
    NoPageImage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for text extraction services.
///
/// Implementors return the text found on the first page of a document,
/// recognised in the given language. The traversal engine treats the result
/// as opaque; any engine honouring this contract is interchangeable.
pub trait TextExtractor: Send + Sync {
    /// Extract the first-page text of the document at `path`.
    fn extract_text(&self, path: &Path, language: &str) -> Result<String, ExtractError>;
}
