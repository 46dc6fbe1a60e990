use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backend::TextExtractor;
use crate::category::Category;
use crate::traversal::{Traversal, TraversalError};
use crate::{ProgressEvent, RunConfig, RunStats};

#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("specified folder doesn't exist: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("specified path is not a folder: {}", .0.display())]
    RootNotADirectory(PathBuf),
    #[error("destination folder doesn't exist: {}", .0.display())]
    DestinationNotFound(PathBuf),
    #[error("destination is not a folder: {}", .0.display())]
    DestinationNotADirectory(PathBuf),
    #[error(transparent)]
    Traversal(#[from] TraversalError),
}

/// Organize every document below `root` in a single pass.
///
/// The root and destination folders are validated before anything is
/// touched; a problem with either is returned as an error. Failures on
/// individual entries during the walk are reported through `progress` and
/// summarised in the returned [`RunStats`], never returned.
pub fn organize(
    root: &Path,
    categories: &[Category],
    config: &RunConfig,
    extractor: &dyn TextExtractor,
    progress: impl Fn(ProgressEvent),
) -> Result<RunStats, OrganizeError> {
    check_folder(root, OrganizeError::RootNotFound, OrganizeError::RootNotADirectory)?;
    check_folder(
        &config.destination_root,
        OrganizeError::DestinationNotFound,
        OrganizeError::DestinationNotADirectory,
    )?;

    if categories.is_empty() {
        tracing::warn!("no categories configured, every document will stay unclassified");
    }
    tracing::info!(
        root = %root.display(),
        destination = %config.destination_root.display(),
        language = %config.language,
        match_mode = %config.match_mode,
        categories = categories.len(),
        dry_run = config.dry_run,
        "starting organization"
    );

    let stats = Traversal::new(categories, config, extractor, &progress).run(root)?;

    tracing::info!(
        organized = stats.organized,
        unclassified = stats.unclassified,
        failures = stats.failures(),
        "organization finished"
    );
    Ok(stats)
}

fn check_folder(
    path: &Path,
    not_found: fn(PathBuf) -> OrganizeError,
    not_a_dir: fn(PathBuf) -> OrganizeError,
) -> Result<(), OrganizeError> {
    if !path.exists() {
        return Err(not_found(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(not_a_dir(path.to_path_buf()));
    }
    Ok(())
}
