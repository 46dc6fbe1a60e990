//! Depth-first walk that extracts, classifies and files every document.
//!
//! Failures below the root are isolated: an unreadable subdirectory, a
//! document the extraction service cannot read, or a move that fails is
//! reported through the progress callback and counted, and the walk carries
//! on with the next entry.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backend::TextExtractor;
use crate::category::Category;
use crate::matching::classify;
use crate::relocate::{self, RelocationError};
use crate::{FileCandidate, ProgressEvent, RunConfig, RunStats};

#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("specified folder doesn't exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("error reading directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One listed directory entry.
struct Entry {
    path: PathBuf,
    name: OsString,
    file_type: FileType,
}

/// A single traversal run.
///
/// Holds the run configuration by reference and accumulates [`RunStats`]
/// for the subtree it walks.
pub struct Traversal<'a> {
    categories: &'a [Category],
    config: &'a RunConfig,
    extractor: &'a dyn TextExtractor,
    progress: &'a dyn Fn(ProgressEvent),
    stats: RunStats,
    /// Destinations handed out by a dry run, which never reach the disk.
    planned: HashSet<PathBuf>,
}

impl<'a> Traversal<'a> {
    pub fn new(
        categories: &'a [Category],
        config: &'a RunConfig,
        extractor: &'a dyn TextExtractor,
        progress: &'a dyn Fn(ProgressEvent),
    ) -> Self {
        Self {
            categories,
            config,
            extractor,
            progress,
            stats: RunStats::default(),
            planned: HashSet::new(),
        }
    }

    /// Walk `root` and everything below it.
    ///
    /// Only a failure to find or list `root` itself is returned as an error.
    pub fn run(mut self, root: &Path) -> Result<RunStats, TraversalError> {
        self.walk(root)?;
        Ok(self.stats)
    }

    fn walk(&mut self, dir: &Path) -> Result<(), TraversalError> {
        if let Err(e) = fs::metadata(dir)
            && e.kind() == io::ErrorKind::NotFound
        {
            return Err(TraversalError::NotFound(dir.to_path_buf()));
        }

        let entries = list_entries(dir)?;
        self.stats.directories_visited += 1;

        for entry in entries {
            if entry.file_type.is_dir() {
                tracing::debug!(path = %entry.path.display(), "entering directory");
                (self.progress)(ProgressEvent::EnteringDirectory {
                    path: entry.path.clone(),
                });
                if let Err(e) = self.walk(&entry.path) {
                    tracing::warn!(path = %entry.path.display(), error = %e, "error processing directory");
                    self.stats.directory_failures += 1;
                    (self.progress)(ProgressEvent::DirectoryFailed {
                        path: entry.path,
                        error: e.to_string(),
                    });
                }
            } else if entry.file_type.is_file() && self.config.is_document(&entry.name) {
                let size = fs::symlink_metadata(&entry.path)
                    .map(|m| m.len())
                    .unwrap_or_default();
                self.process(FileCandidate {
                    path: entry.path,
                    name: entry.name,
                    size,
                });
            } else if entry.file_type.is_symlink() {
                tracing::debug!(path = %entry.path.display(), "not following symbolic link");
            }
        }

        Ok(())
    }

    fn process(&mut self, candidate: FileCandidate) {
        self.stats.candidates += 1;
        tracing::debug!(path = %candidate.path.display(), size = candidate.size, "processing file");
        (self.progress)(ProgressEvent::Processing {
            path: candidate.path.clone(),
            size: candidate.size,
        });

        let text = match self
            .extractor
            .extract_text(&candidate.path, &self.config.language)
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %candidate.path.display(), error = %e, "text extraction failed");
                self.stats.extraction_failures += 1;
                (self.progress)(ProgressEvent::ExtractionFailed {
                    path: candidate.path,
                    error: e.to_string(),
                });
                return;
            }
        };

        tracing::debug!(path = %candidate.path.display(), chars = text.chars().count(), "extracted text");
        if self.config.verbose {
            (self.progress)(ProgressEvent::Extracted {
                path: candidate.path.clone(),
                text: text.clone(),
            });
        }

        let text_lower = text.to_lowercase();
        let Some(category) = classify(&text_lower, self.categories, self.config.match_mode) else {
            self.stats.unclassified += 1;
            (self.progress)(ProgressEvent::Unclassified {
                path: candidate.path,
            });
            return;
        };
        let category = category.name().to_string();
        tracing::debug!(path = %candidate.path.display(), category = %category, "assigned category");

        if self.already_filed(&candidate.path, &category) {
            self.stats.already_organized += 1;
            (self.progress)(ProgressEvent::AlreadyOrganized {
                path: candidate.path,
                category,
            });
            return;
        }

        let result = if self.config.dry_run {
            self.plan(&candidate, &category)
        } else {
            self.relocate(&candidate, &category)
        };
        if let Err(e) = result {
            tracing::warn!(path = %candidate.path.display(), category = %category, error = %e, "relocation failed");
            self.stats.relocation_failures += 1;
            (self.progress)(ProgressEvent::RelocationFailed {
                path: candidate.path,
                category,
                error: e.to_string(),
            });
        }
    }

    fn relocate(&mut self, candidate: &FileCandidate, category: &str) -> Result<(), RelocationError> {
        let relocation = relocate::relocate(
            &candidate.path,
            &self.config.destination_root,
            category,
            &candidate.name,
        )?;
        if relocation.created_folder
            && let Some(folder) = relocation.destination.parent()
        {
            (self.progress)(ProgressEvent::CategoryFolderCreated {
                path: folder.to_path_buf(),
            });
        }
        self.stats.organized += 1;
        (self.progress)(ProgressEvent::Organized {
            source: candidate.path.clone(),
            destination: relocation.destination,
            category: category.to_string(),
            collisions: relocation.collisions,
        });
        Ok(())
    }

    fn plan(&mut self, candidate: &FileCandidate, category: &str) -> Result<(), RelocationError> {
        let folder = relocate::category_folder(&self.config.destination_root, category)?;
        let (destination, _) =
            relocate::free_destination_excluding(&folder, &candidate.name, |path| {
                self.planned.contains(path)
            })?;
        self.planned.insert(destination.clone());
        self.stats.organized += 1;
        (self.progress)(ProgressEvent::WouldOrganize {
            source: candidate.path.clone(),
            destination,
            category: category.to_string(),
        });
        Ok(())
    }

    /// Whether `path` already lives in the folder of `category`.
    fn already_filed(&self, path: &Path, category: &str) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        let Ok(folder) = relocate::category_folder(&self.config.destination_root, category) else {
            return false;
        };
        match (fs::canonicalize(parent), fs::canonicalize(&folder)) {
            (Ok(a), Ok(b)) => a == b,
            _ => parent == folder,
        }
    }
}

/// List `dir`, sorted by file name.
///
/// Entries that cannot be read or typed are logged and left out.
fn list_entries(dir: &Path) -> Result<Vec<Entry>, TraversalError> {
    let read_dir = fs::read_dir(dir).map_err(|e| TraversalError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut entries = Vec::new();
    for item in read_dir {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "error reading directory entry");
                continue;
            }
        };
        let file_type = match item.file_type() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %item.path().display(), error = %e, "error reading entry type");
                continue;
            }
        };
        entries.push(Entry {
            path: item.path(),
            name: item.file_name(),
            file_type,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
