//! Whole-run orchestration: preflight, patch each target, write back.

use crate::config::PatcherConfig;
use crate::document::SourceDocument;
use crate::engine::{FileEdit, PatchEngine, PatchError};
use crate::io::{read_document, write_document};
use crate::safety::ProjectGuard;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute every patch but write nothing
    pub dry_run: bool,
}

/// One target after all of its rules ran.
#[derive(Debug)]
pub struct ProcessedFile {
    pub edit: FileEdit,
    /// Final in-memory document, holding both original and patched text
    pub document: SourceDocument,
    pub written: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Canonical project root
    pub root: PathBuf,
    pub files: Vec<ProcessedFile>,
}

impl RunOutcome {
    pub fn edits(&self) -> Vec<FileEdit> {
        self.files.iter().map(|file| file.edit.clone()).collect()
    }

    pub fn any_changed(&self) -> bool {
        self.files.iter().any(|file| file.edit.changed)
    }
}

/// Resolve and check every target before any file is patched.
fn preflight(guard: &ProjectGuard, config: &PatcherConfig) -> Result<Vec<PathBuf>, PatchError> {
    let mut paths = Vec::new();

    for (label, target) in config.targets.iter() {
        let path = guard.root().join(target);
        if !path.is_file() {
            return Err(PatchError::MissingInputFile { path });
        }
        let path = guard.validate_path(&path)?;
        debug!(role = label, path = %path.display(), "target resolved");
        paths.push(path);
    }

    Ok(paths)
}

/// Patch every configured target under `root`.
///
/// Files are processed strictly in order. A fatal error stops the run;
/// files already written stay written.
pub fn run(root: &Path, config: &PatcherConfig, options: RunOptions) -> Result<RunOutcome, PatchError> {
    let engine = PatchEngine::from_config(config)?;
    let guard = ProjectGuard::new(root)?;
    let paths = preflight(&guard, config)?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let mut document = read_document(&path)?;
        let edit = engine.apply(&mut document)?;

        let written = edit.changed && !options.dry_run;
        if written {
            write_document(&document)?;
            info!(file = %path.display(), changes = edit.details.len(), "patched");
        } else if edit.changed {
            info!(file = %path.display(), "would patch (dry run)");
        }

        files.push(ProcessedFile {
            edit,
            document,
            written,
        });
    }

    Ok(RunOutcome {
        root: guard.root().to_path_buf(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_missing_file_aborts_before_patching() {
        let dir = tempfile::tempdir().unwrap();
        let data = "P rtP = {0};\n";
        write(dir.path(), "Src/BLDC_controller_data.c", data);

        let err = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap_err();
        assert!(matches!(err, PatchError::MissingInputFile { .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join("Src/BLDC_controller_data.c")).unwrap(),
            data
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PatcherConfig::default();
        config.targets.header = "h/BLDC_controller.h".to_string();
        config.targets.source = "s/BLDC_controller.c".to_string();
        config.targets.data = "d/BLDC_controller_data.c".to_string();

        let header = "#ifndef BLDC_controller_COMMON_INCLUDES_\n\
#define BLDC_controller_COMMON_INCLUDES_\n\
#include \"rtwtypes.h\"\n\
#endif\n\
struct tag_RTM {\n  int x;\n};\n";
        write(dir.path(), &config.targets.header, header);
        write(dir.path(), &config.targets.source, "x = rtP.a;\n");
        write(dir.path(), &config.targets.data, "P rtP = {0};\n");

        let outcome = run(dir.path(), &config, RunOptions { dry_run: true }).unwrap();
        assert!(outcome.any_changed());
        assert!(outcome.files.iter().all(|file| !file.written));
        assert_eq!(
            fs::read_to_string(dir.path().join(&config.targets.source)).unwrap(),
            "x = rtP.a;\n"
        );
        assert_eq!(outcome.files[1].document.text(), "x = rtP->a;\n");
    }

    #[test]
    fn test_anchor_failure_leaves_file_unwritten() {
        let dir = tempfile::tempdir().unwrap();
        let config = PatcherConfig::default();
        // Guarded include would apply, but the struct is gone
        write(
            dir.path(),
            &config.targets.header,
            "#ifndef BLDC_controller_COMMON_INCLUDES_\n\
#define BLDC_controller_COMMON_INCLUDES_\n\
#include \"rtwtypes.h\"\n\
#endif\n",
        );
        write(dir.path(), &config.targets.source, "x = rtP.a;\n");
        write(dir.path(), &config.targets.data, "P rtP = {0};\n");

        let err = run(dir.path(), &config, RunOptions::default()).unwrap_err();
        assert!(matches!(err, PatchError::StructuralAnchorMissing { .. }));
        let header = fs::read_to_string(dir.path().join(&config.targets.header)).unwrap();
        assert!(!header.contains("mcu_model"));
        assert_eq!(
            fs::read_to_string(dir.path().join(&config.targets.source)).unwrap(),
            "x = rtP.a;\n"
        );
    }
}
