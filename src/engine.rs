//! Patch engine - threads a document through its ordered rule list
//!
//! The engine never touches the filesystem. A fatal rule failure returns
//! immediately, leaving the in-memory edits of that document unwritten.

use crate::anchor::AnchorError;
use crate::config::PatcherConfig;
use crate::document::SourceDocument;
use crate::io::IoError;
use crate::rules::{default_rules, PatchRule, RuleError};
use crate::safety::SafetyError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("missing expected file: {}", path.display())]
    MissingInputFile { path: PathBuf },

    #[error("{}: {source} (rule '{rule}'; generated structure changed, refusing to patch)", file.display())]
    StructuralAnchorMissing {
        file: PathBuf,
        rule: String,
        #[source]
        source: AnchorError,
    },

    #[error("{}: rule '{rule}' failed: {source}", file.display())]
    Rule {
        file: PathBuf,
        rule: String,
        #[source]
        source: RuleError,
    },

    #[error("failed to build rule set: {0}")]
    RuleSet(#[source] RuleError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// Per-file aggregate of rule outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub path: PathBuf,
    /// Whether the final text differs from the original
    pub changed: bool,
    /// Details from every rule that changed the text, in rule order
    pub details: Vec<String>,
}

/// Ordered rule list plus dispatch by file name.
pub struct PatchEngine {
    rules: Vec<Box<dyn PatchRule>>,
}

impl PatchEngine {
    pub fn new(rules: Vec<Box<dyn PatchRule>>) -> Self {
        Self { rules }
    }

    /// Engine with the standard rule set for `config`.
    pub fn from_config(config: &PatcherConfig) -> Result<Self, PatchError> {
        let rules = default_rules(&config.targets, &config.symbols).map_err(PatchError::RuleSet)?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[Box<dyn PatchRule>] {
        &self.rules
    }

    /// Rules applicable to `path`, in application order.
    pub fn rules_for<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a dyn PatchRule> + 'a {
        self.rules
            .iter()
            .map(|rule| rule.as_ref())
            .filter(move |rule| rule.applies_to(path))
    }

    /// Apply every applicable rule to `doc`, in order.
    ///
    /// Each rule sees the output of the previous one.
    pub fn apply(&self, doc: &mut SourceDocument) -> Result<FileEdit, PatchError> {
        let path = doc.path().to_path_buf();
        let mut details = Vec::new();

        for rule in self.rules_for(&path) {
            match rule.apply(doc) {
                Ok(result) => details.extend(result.details),
                Err(RuleError::Anchor(source)) => {
                    return Err(PatchError::StructuralAnchorMissing {
                        file: path.clone(),
                        rule: rule.name().to_string(),
                        source,
                    });
                }
                Err(source) => {
                    return Err(PatchError::Rule {
                        file: path.clone(),
                        rule: rule.name().to_string(),
                        source,
                    });
                }
            }
        }

        let changed = doc.is_modified();
        debug!(file = %path.display(), changed, revision = doc.revision(), "file processed");

        Ok(FileEdit {
            path,
            changed,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PatchEngine {
        PatchEngine::from_config(&PatcherConfig::default()).unwrap()
    }

    #[test]
    fn test_dispatch_by_file_name() {
        let engine = engine();
        let header: Vec<&str> = engine
            .rules_for(Path::new("Inc/BLDC_controller.h"))
            .map(|r| r.name())
            .collect();
        assert_eq!(
            header,
            vec!["guarded-include", "default-param-field", "extern-decl-comment"]
        );
        assert_eq!(engine.rules_for(Path::new("Src/BLDC_controller.c")).count(), 3);
        assert_eq!(engine.rules_for(Path::new("Src/BLDC_controller_data.c")).count(), 1);
        assert_eq!(engine.rules_for(Path::new("Src/main.c")).count(), 0);
    }

    #[test]
    fn test_unrelated_file_is_untouched() {
        let mut doc = SourceDocument::new("Src/main.c", "int main(void) { return rtP.x; }\n");
        let edit = engine().apply(&mut doc).unwrap();
        assert!(!edit.changed);
        assert!(edit.details.is_empty());
    }

    #[test]
    fn test_missing_struct_aborts_with_anchor_error() {
        let text = "#ifndef BLDC_controller_COMMON_INCLUDES_\n\
#define BLDC_controller_COMMON_INCLUDES_\n\
#include \"rtwtypes.h\"\n\
#endif\n";
        let mut doc = SourceDocument::new("Inc/BLDC_controller.h", text);
        let err = engine().apply(&mut doc).unwrap_err();

        match err {
            PatchError::StructuralAnchorMissing { rule, .. } => {
                assert_eq!(rule, "default-param-field")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_data_file_renamed() {
        let mut doc = SourceDocument::new("Src/BLDC_controller_data.c", "P rtP = {\n  1\n};\n");
        let edit = engine().apply(&mut doc).unwrap();
        assert!(edit.changed);
        assert_eq!(doc.text(), "P rtP_Left = {\n  1\n};\n");
    }
}
