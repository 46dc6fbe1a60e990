//! Collision-safe move of a document into its category folder.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelocationError {
    #[error("invalid category folder name: {0:?}")]
    InvalidCategory(String),
    #[error("error creating folder {}: {source}", .path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("error checking destination file {}: {source}", .path.display())]
    ExistenceCheck {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error moving {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of a successful move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Final path of the file, possibly with a disambiguation counter.
    pub destination: PathBuf,
    /// The category folder did not exist and was created by this move.
    pub created_folder: bool,
    /// Number of taken names skipped before a free one was found.
    pub collisions: u32,
}

/// Move `source` into `destination_root/category/`, never overwriting.
///
/// The category folder is created when missing. If `file_name` is taken,
/// `"<stem> (<n>)<.ext>"` is tried for n = 1, 2, ... until a free name is
/// found. The counter is unbounded.
pub fn relocate(
    source: &Path,
    destination_root: &Path,
    category: &str,
    file_name: &OsStr,
) -> Result<Relocation, RelocationError> {
    let folder = category_folder(destination_root, category)?;
    let created_folder = ensure_folder(&folder)?;
    if created_folder {
        tracing::debug!(path = %folder.display(), "created category folder");
    }

    let (destination, collisions) = free_destination(&folder, file_name)?;

    fs::rename(source, &destination).map_err(|e| RelocationError::Rename {
        from: source.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    Ok(Relocation {
        destination,
        created_folder,
        collisions,
    })
}

/// Path of the folder for `category` under `destination_root`.
///
/// The category name must be a single plain path component so a file can
/// never be moved outside the destination root.
pub fn category_folder(destination_root: &Path, category: &str) -> Result<PathBuf, RelocationError> {
    let mut components = Path::new(category).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(destination_root.join(category)),
        _ => Err(RelocationError::InvalidCategory(category.to_string())),
    }
}

/// Find the first unused name for `file_name` inside `folder`.
///
/// Returns the candidate path and the number of names that were taken.
/// A missing `folder` simply yields the original name.
pub fn free_destination(
    folder: &Path,
    file_name: &OsStr,
) -> Result<(PathBuf, u32), RelocationError> {
    free_destination_excluding(folder, file_name, |_| false)
}

/// Like [`free_destination`], but names for which `reserved` returns true
/// are skipped as if they existed on disk.
pub fn free_destination_excluding(
    folder: &Path,
    file_name: &OsStr,
    reserved: impl Fn(&Path) -> bool,
) -> Result<(PathBuf, u32), RelocationError> {
    let mut counter: u32 = 0;
    let mut candidate = folder.join(file_name);
    loop {
        let taken = reserved(candidate.as_path())
            || match fs::symlink_metadata(&candidate) {
                Ok(_) => true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => {
                    return Err(RelocationError::ExistenceCheck {
                        path: candidate,
                        source: e,
                    });
                }
            };
        if !taken {
            return Ok((candidate, counter));
        }

        counter += 1;
        let next = disambiguated_name(file_name, counter);
        tracing::debug!(
            taken = %candidate.display(),
            next = %next.to_string_lossy(),
            "duplicate found, trying new name"
        );
        candidate = folder.join(next);
    }
}

/// Build `"<stem> (<counter>)<.ext>"` from the original file name.
///
/// The extension is split at the last dot, so `a.tar.gz` becomes
/// `a.tar (1).gz` and `.pdf` becomes ` (1).pdf`. Names without a dot get
/// the counter appended.
pub fn disambiguated_name(file_name: &OsStr, counter: u32) -> OsString {
    let (stem, ext) = split_extension(file_name);
    let mut name = OsString::from(stem);
    name.push(format!(" ({counter})"));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Split `file_name` at its last dot. A leading dot counts, so `.pdf` has an
/// empty stem and the extension `pdf`.
pub(crate) fn split_extension(file_name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    if let Some((stem, ext)) = file_name.to_str().and_then(|n| n.rsplit_once('.')) {
        return (OsStr::new(stem), Some(OsStr::new(ext)));
    }
    let path = Path::new(file_name);
    (path.file_stem().unwrap_or(file_name), path.extension())
}

/// Create `folder` if needed. Returns whether it was created.
fn ensure_folder(folder: &Path) -> Result<bool, RelocationError> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    match builder.create(folder) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if folder.is_dir() {
                Ok(false)
            } else {
                Err(RelocationError::NotADirectory(folder.to_path_buf()))
            }
        }
        Err(e) => Err(RelocationError::CreateFolder {
            path: folder.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn disambiguated_names() {
        assert_eq!(disambiguated_name(OsStr::new("x.pdf"), 1), "x (1).pdf");
        assert_eq!(disambiguated_name(OsStr::new("x.pdf"), 12), "x (12).pdf");
        assert_eq!(disambiguated_name(OsStr::new("notes"), 2), "notes (2)");
        assert_eq!(disambiguated_name(OsStr::new("a.tar.gz"), 1), "a.tar (1).gz");
        assert_eq!(disambiguated_name(OsStr::new("Scan.PDF"), 3), "Scan (3).PDF");
        assert_eq!(disambiguated_name(OsStr::new(".pdf"), 1), " (1).pdf");
    }

    #[test]
    fn three_same_named_files_do_not_overwrite() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let mut moved = Vec::new();
        for i in 0..3 {
            let dir = src.path().join(format!("batch{i}"));
            fs::create_dir(&dir).unwrap();
            let file = write(&dir, "x.pdf", &format!("contents {i}"));
            let relocation = relocate(&file, dest.path(), "Invoices", OsStr::new("x.pdf")).unwrap();
            assert_eq!(relocation.collisions, i);
            assert_eq!(relocation.created_folder, i == 0);
            assert!(!file.exists());
            moved.push(relocation.destination);
        }

        let folder = dest.path().join("Invoices");
        assert_eq!(
            moved,
            vec![
                folder.join("x.pdf"),
                folder.join("x (1).pdf"),
                folder.join("x (2).pdf"),
            ]
        );
        for (i, path) in moved.iter().enumerate() {
            assert_eq!(fs::read_to_string(path).unwrap(), format!("contents {i}"));
        }
    }

    #[test]
    fn existing_folder_is_reused() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir(dest.path().join("Bills")).unwrap();

        let file = write(src.path(), "light.pdf", "kwh");
        let relocation = relocate(&file, dest.path(), "Bills", OsStr::new("light.pdf")).unwrap();
        assert!(!relocation.created_folder);
        assert_eq!(relocation.destination, dest.path().join("Bills").join("light.pdf"));
    }

    #[cfg(unix)]
    #[test]
    fn created_folder_is_owner_accessible() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = write(src.path(), "a.pdf", "a");
        relocate(&file, dest.path(), "Docs", OsStr::new("a.pdf")).unwrap();

        let mode = fs::metadata(dest.path().join("Docs")).unwrap().permissions().mode();
        assert_eq!(mode & 0o700, 0o700);
    }

    #[test]
    fn file_in_place_of_folder_is_an_error() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(dest.path(), "Invoices", "not a folder");
        let file = write(src.path(), "a.pdf", "a");

        let err = relocate(&file, dest.path(), "Invoices", OsStr::new("a.pdf")).unwrap_err();
        assert!(matches!(err, RelocationError::NotADirectory(_)));
        assert!(file.exists());
    }

    #[test]
    fn category_must_be_a_single_component() {
        let dest = Path::new("/tmp/dest");
        assert!(category_folder(dest, "Invoices").is_ok());
        for bad in ["", ".", "..", "a/b", "../escape", "/abs"] {
            assert!(
                matches!(
                    category_folder(dest, bad),
                    Err(RelocationError::InvalidCategory(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_source_reports_rename_error() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let missing = src.path().join("gone.pdf");

        let err = relocate(&missing, dest.path(), "Invoices", OsStr::new("gone.pdf")).unwrap_err();
        assert!(matches!(err, RelocationError::Rename { .. }));
        assert!(!dest.path().join("Invoices").join("gone.pdf").exists());
    }

    #[test]
    fn free_destination_on_missing_folder_keeps_name() {
        let dest = TempDir::new().unwrap();
        let folder = dest.path().join("NotYet");
        let (path, collisions) = free_destination(&folder, OsStr::new("a.pdf")).unwrap();
        assert_eq!(path, folder.join("a.pdf"));
        assert_eq!(collisions, 0);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_counts_as_taken() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let folder = dest.path().join("Invoices");
        fs::create_dir(&folder).unwrap();
        std::os::unix::fs::symlink(dest.path().join("nowhere"), folder.join("a.pdf")).unwrap();

        let file = write(src.path(), "a.pdf", "a");
        let relocation = relocate(&file, dest.path(), "Invoices", OsStr::new("a.pdf")).unwrap();
        assert_eq!(relocation.destination, folder.join("a (1).pdf"));
        assert!(fs::symlink_metadata(folder.join("a.pdf")).unwrap().file_type().is_symlink());
    }

    #[test]
    fn failed_existence_check_stops_the_move() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let folder = dest.path().join("Invoices");
        fs::create_dir(&folder).unwrap();

        // 254 bytes fits; adding " (1)" exceeds the usual 255-byte name limit.
        let long_name = format!("{}.pdf", "a".repeat(250));
        write(&folder, &long_name, "already here");
        let file = write(src.path(), &long_name, "new");

        let err = relocate(&file, dest.path(), "Invoices", OsStr::new(&long_name)).unwrap_err();
        match err {
            RelocationError::ExistenceCheck { path, .. } => {
                assert_eq!(path, folder.join(disambiguated_name(OsStr::new(&long_name), 1)));
            }
            other => panic!("expected ExistenceCheck, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
        assert_eq!(fs::read_to_string(folder.join(&long_name)).unwrap(), "already here");
    }

    #[test]
    fn reserved_names_are_skipped() {
        let dest = TempDir::new().unwrap();
        let folder = dest.path().join("Invoices");
        fs::create_dir(&folder).unwrap();
        write(&folder, "x.pdf", "on disk");

        let reserved = [folder.join("x (1).pdf")];
        let (path, collisions) = free_destination_excluding(&folder, OsStr::new("x.pdf"), |p| {
            reserved.iter().any(|r| r == p)
        })
        .unwrap();
        assert_eq!(path, folder.join("x (2).pdf"));
        assert_eq!(collisions, 2);
    }
}
