//! Postgen Patcher: reapplies project adaptations to generated C sources
//!
//! A code generator that cannot be modified re-emits its header, source and
//! parameter data files on every run, dropping a handful of project-specific
//! integration tweaks. This crate reapplies them: each tweak is a
//! [`PatchRule`] that checks whether it is already present, locates a stable
//! landmark in the generated text, and edits the text exactly once.
//!
//! # Architecture
//!
//! All rules compile down to byte-span [`Edit`]s with before-text
//! verification. Intelligence lives in landmark resolution
//! ([`AnchorMatcher`]), not in application.
//!
//! # Guarantees
//!
//! - Every rule is idempotent; a second run over patched files changes nothing
//! - Line endings (CRLF or LF) are detected per file and preserved
//! - A file is written only after all of its rules succeeded (atomic
//!   tempfile + fsync + rename)
//! - A missing structural landmark aborts the run instead of silently
//!   skipping an adaptation
//!
//! # Example
//!
//! ```
//! use postgen_patcher::{PatchEngine, PatcherConfig, SourceDocument};
//!
//! let engine = PatchEngine::from_config(&PatcherConfig::default()).unwrap();
//! let mut doc = SourceDocument::new("Src/BLDC_controller_data.c", "P rtP = {\n  1\n};\n");
//!
//! let edit = engine.apply(&mut doc).unwrap();
//! assert!(edit.changed);
//! assert_eq!(doc.text(), "P rtP_Left = {\n  1\n};\n");
//! ```

pub mod anchor;
pub mod config;
pub mod document;
pub mod edit;
pub mod engine;
pub mod io;
pub mod report;
pub mod rules;
pub mod runner;
pub mod safety;

// Re-exports
pub use anchor::{Anchor, AnchorError, AnchorMatcher, Landmark};
pub use config::{
    discover, load_from_path, load_from_str, ConfigError, PatcherConfig, Symbols, Targets,
};
pub use document::{LineEnding, SourceDocument};
pub use edit::{apply_edits, Edit, EditError, EditVerification};
pub use engine::{FileEdit, PatchEngine, PatchError};
pub use report::{ChangeReport, ReportLine};
pub use rules::{default_rules, PatchResult, PatchRule, RuleError};
pub use runner::{run, ProcessedFile, RunOptions, RunOutcome};
pub use safety::{ProjectGuard, SafetyError};
