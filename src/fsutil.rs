//! Filesystem helpers: whole-file reads, copies, recursive listings, sizes
//! and pattern-based pruning.
//!
//! Failures are logged at the point they happen. The typed functions return
//! them as [`FsError`]; the `_or_empty` / listing variants degrade to an empty
//! value instead.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors produced by the filesystem helpers.
#[derive(Debug)]
pub enum FsError {
    /// Failed to open a file for reading.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create or truncate a destination file.
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed while reading an opened file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed while streaming bytes from one file to another.
    Copy {
        src: PathBuf,
        dst: PathBuf,
        source: std::io::Error,
    },
    /// Failed to stat a path.
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to remove a file.
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file-name pattern could not be compiled.
    Pattern(glob::PatternError),
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsError::Open { path, source } => {
                write!(f, "open file failed {}: {}", path.display(), source)
            }
            FsError::Create { path, source } => {
                write!(f, "create file failed {}: {}", path.display(), source)
            }
            FsError::Read { path, source } => {
                write!(f, "read file failed {}: {}", path.display(), source)
            }
            FsError::Copy { src, dst, source } => write!(
                f,
                "copy {} -> {} failed: {}",
                src.display(),
                dst.display(),
                source
            ),
            FsError::Metadata { path, source } => {
                write!(f, "stat failed {}: {}", path.display(), source)
            }
            FsError::Remove { path, source } => {
                write!(f, "remove failed {}: {}", path.display(), source)
            }
            FsError::Pattern(e) => write!(f, "invalid file pattern: {e}"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Open { source, .. }
            | FsError::Create { source, .. }
            | FsError::Read { source, .. }
            | FsError::Copy { source, .. }
            | FsError::Metadata { source, .. }
            | FsError::Remove { source, .. } => Some(source),
            FsError::Pattern(e) => Some(e),
        }
    }
}

impl From<glob::PatternError> for FsError {
    fn from(e: glob::PatternError) -> Self {
        FsError::Pattern(e)
    }
}

/// Read an entire file into memory.
pub fn read_file(path: &Path) -> Result<Vec<u8>, FsError> {
    let mut file = File::open(path).map_err(|e| {
        tracing::warn!(error = %e, path = %path.display(), "open file failed");
        FsError::Open {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer).map_err(|e| {
        tracing::warn!(error = %e, path = %path.display(), "read file failed");
        FsError::Read {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    Ok(buffer)
}

/// Read an entire file, returning an empty buffer on any failure.
///
/// Callers cannot tell an empty file from a failed read through the return
/// value; the failure is only visible in the log. Prefer [`read_file`].
pub fn read_file_or_empty(path: &Path) -> Vec<u8> {
    match read_file(path) {
        Ok(buffer) => buffer,
        Err(_) => Vec::new(),
    }
}

/// Copy `src` to `dst`, creating or truncating `dst`.
///
/// Returns the number of bytes copied. Fails before copying anything if the
/// destination cannot be created.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, FsError> {
    let mut src_file = File::open(src).map_err(|e| {
        tracing::warn!(error = %e, path = %src.display(), "failed to open copy source");
        FsError::Open {
            path: src.to_path_buf(),
            source: e,
        }
    })?;

    let mut dst_file = File::create(dst).map_err(|e| {
        tracing::warn!(error = %e, path = %dst.display(), "failed to create copy destination");
        FsError::Create {
            path: dst.to_path_buf(),
            source: e,
        }
    })?;

    let copied = std::io::copy(&mut src_file, &mut dst_file).map_err(|e| {
        tracing::warn!(error = %e, src = %src.display(), dst = %dst.display(), "copy failed");
        FsError::Copy {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source: e,
        }
    })?;

    tracing::debug!(
        src = %src.display(),
        dst = %dst.display(),
        bytes = copied,
        "copied file"
    );
    Ok(copied)
}

/// Recursively list every non-directory entry under `root`.
///
/// Entries come back in walk order with siblings sorted by file name.
/// Directories are skipped. Walk errors are logged and the walk continues.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => {}
            Ok(entry) => files.push(entry.into_path()),
            Err(e) => {
                tracing::warn!(error = %e, root = %root.display(), "walk error");
            }
        }
    }
    files
}

/// Size of a file in bytes, or 0 if it does not exist.
pub fn file_size(path: &Path) -> Result<u64, FsError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "stat failed");
            Err(FsError::Metadata {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }
}

/// Remove every file under `root` whose file name matches the glob `pattern`.
///
/// Directories are never removed. A file that fails to delete is logged and
/// skipped. Returns the paths that were removed, in walk order.
pub fn remove_matching_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, FsError> {
    let pattern = glob::Pattern::new(pattern)?;
    let mut removed = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, root = %root.display(), "walk error");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            tracing::debug!(dir = %entry.path().display(), "visiting directory");
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .map(|name| pattern.matches(name))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(file = %entry.path().display(), "removed matching file");
                removed.push(entry.into_path());
            }
            Err(e) => {
                let err = FsError::Remove {
                    path: entry.path().to_path_buf(),
                    source: e,
                };
                tracing::warn!(error = %err, "failed to remove matching file");
            }
        }
    }

    Ok(removed)
}
