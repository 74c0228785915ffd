use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps every patched file inside the project root.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    /// Absolute, canonical path to the project root
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside project: {} (project: {})", path.display(), root.display())]
    OutsideProject { path: PathBuf, root: PathBuf },

    #[error("failed to canonicalize {}: {source}", path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectGuard {
    /// Create a guard for `root`, canonicalized to handle symlinks correctly.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|source| SafetyError::Canonicalize {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Check that an existing file is safe to patch.
    ///
    /// Relative paths resolve against the project root. Returns the
    /// canonical absolute path.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = absolute
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize {
                path: absolute.clone(),
                source,
            })?;

        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideProject {
                path: canonical,
                root: self.root.clone(),
            });
        }

        Ok(canonical)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
