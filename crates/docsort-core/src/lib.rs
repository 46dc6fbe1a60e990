use std::ffi::OsString;
use std::path::PathBuf;

pub mod backend;
pub mod category;
pub mod config_file;
pub mod matching;
pub mod mock;
pub mod orchestrator;
pub mod relocate;
pub mod traversal;

// Re-export for convenience
pub use backend::{ExtractError, TextExtractor};
pub use category::{Category, MatchMode};
pub use matching::classify;
pub use orchestrator::{OrganizeError, organize};
pub use relocate::{Relocation, RelocationError, relocate};
pub use traversal::{Traversal, TraversalError};

/// OCR language used when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "por";

/// Extension (without the dot) of the documents that are classified.
pub const DEFAULT_EXTENSION: &str = "pdf";

/// A document found during traversal. Lives for one traversal step.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: OsString,
    pub size: u64,
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    EnteringDirectory {
        path: PathBuf,
    },
    Processing {
        path: PathBuf,
        size: u64,
    },
    /// Raw extracted text. Only emitted in verbose runs.
    Extracted {
        path: PathBuf,
        text: String,
    },
    Unclassified {
        path: PathBuf,
    },
    CategoryFolderCreated {
        path: PathBuf,
    },
    Organized {
        source: PathBuf,
        destination: PathBuf,
        category: String,
        /// Taken names skipped before `destination` was found.
        collisions: u32,
    },
    /// Dry run: where the file would have been moved.
    WouldOrganize {
        source: PathBuf,
        destination: PathBuf,
        category: String,
    },
    /// The file already sits in the folder of the category it matched.
    AlreadyOrganized {
        path: PathBuf,
        category: String,
    },
    ExtractionFailed {
        path: PathBuf,
        error: String,
    },
    RelocationFailed {
        path: PathBuf,
        category: String,
        error: String,
    },
    DirectoryFailed {
        path: PathBuf,
        error: String,
    },
}

/// Summary statistics for a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub directories_visited: usize,
    pub candidates: usize,
    /// Files moved, or in a dry run, files that would have been moved.
    pub organized: usize,
    pub unclassified: usize,
    pub already_organized: usize,
    pub extraction_failures: usize,
    pub relocation_failures: usize,
    pub directory_failures: usize,
}

impl RunStats {
    /// Per-entry failures that were reported and skipped.
    pub fn failures(&self) -> usize {
        self.extraction_failures + self.relocation_failures + self.directory_failures
    }
}

/// Run-scoped settings, fixed for the duration of one invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Language code handed to the text extraction service.
    pub language: String,
    pub match_mode: MatchMode,
    /// Category folders are created here, not next to the source files.
    pub destination_root: PathBuf,
    /// Recognised document extension, compared case-insensitively.
    pub extension: String,
    /// Emit [`ProgressEvent::Extracted`] with the extracted text.
    pub verbose: bool,
    /// Classify and report, but never create folders or move files.
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            match_mode: MatchMode::Any,
            destination_root: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_string(),
            verbose: false,
            dry_run: false,
        }
    }
}

impl RunConfig {
    /// Whether `name` carries the recognised document extension.
    ///
    /// The extension is whatever follows the last dot, so a file named
    /// exactly `.pdf` is a document too.
    pub fn is_document(&self, name: &std::ffi::OsStr) -> bool {
        let wanted = self.extension.trim_start_matches('.');
        relocate::split_extension(name)
            .1
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn document_extension_is_case_insensitive() {
        let config = RunConfig::default();
        assert!(config.is_document(OsStr::new("scan.pdf")));
        assert!(config.is_document(OsStr::new("SCAN.PDF")));
        assert!(config.is_document(OsStr::new("a.b.Pdf")));
        assert!(!config.is_document(OsStr::new("scan.pdf.txt")));
        assert!(!config.is_document(OsStr::new("pdf")));
        assert!(!config.is_document(OsStr::new("notes.txt")));
        assert!(config.is_document(OsStr::new(".pdf")));
        assert!(config.is_document(OsStr::new(".PDF")));
    }

    #[test]
    fn extension_may_be_configured_with_a_dot() {
        let config = RunConfig {
            extension: ".tiff".to_string(),
            ..RunConfig::default()
        };
        assert!(config.is_document(OsStr::new("fax.TIFF")));
        assert!(!config.is_document(OsStr::new("fax.pdf")));
    }

    #[test]
    fn failures_sum_every_kind() {
        let stats = RunStats {
            extraction_failures: 2,
            relocation_failures: 1,
            directory_failures: 3,
            organized: 10,
            ..RunStats::default()
        };
        assert_eq!(stats.failures(), 6);
    }
}
