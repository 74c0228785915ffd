//! Reading and writing generated files.
//!
//! Text is read and written as raw bytes so line endings survive verbatim,
//! whatever the host platform's default.

use crate::document::SourceDocument;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Utf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a file into a [`SourceDocument`] without newline translation.
pub fn read_document(path: &Path) -> Result<SourceDocument, IoError> {
    let bytes = fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| IoError::Utf8 {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceDocument::new(path, text))
}

/// Write the document's current text back to its path atomically.
pub fn write_document(doc: &SourceDocument) -> Result<(), IoError> {
    let path = doc.path();
    let wrap = |source| IoError::Write {
        path: path.to_path_buf(),
        source,
    };

    atomic_write(path, doc.text().as_bytes()).map_err(wrap)?;

    // Bump mtime so make-based firmware builds pick up the change
    filetime::set_file_mtime(path, filetime::FileTime::now()).map_err(wrap)?;

    Ok(())
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the original file is left untouched.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original file's permissions
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
