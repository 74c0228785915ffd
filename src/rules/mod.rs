//! The adaptation rules reapplied after every code generation.
//!
//! Each rule is an idempotent patch: an "already applied?" predicate, an
//! anchor to locate, and a text transformation expressed as [`Edit`]s.
//! Applying a rule whose predicate holds is a no-op, so the whole rule list
//! converges to a fixed point after one run.

pub mod data;
pub mod header;
pub mod source;

use crate::anchor::{Anchor, AnchorError, Landmark};
use crate::config::{Symbols, Targets};
use crate::document::SourceDocument;
use crate::edit::{Edit, EditError};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub use data::ParamStructRenamePatch;
pub use header::{DefaultParamFieldPatch, ExternDeclCommentPatch, GuardedIncludePatch};
pub use source::{LocalParamPointerPatch, PointerDotAccessPatch, IDEMPOTENCY_WINDOW};

#[derive(Error, Debug)]
pub enum RuleError {
    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error("edit error: {0}")]
    Edit(#[from] EditError),

    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Outcome of applying one rule to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "PatchResult should be checked for changes"]
pub struct PatchResult {
    /// Whether the rule rewrote the text
    pub changed: bool,
    /// Human-readable description of what changed
    pub details: Vec<String>,
}

impl PatchResult {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed(details: Vec<String>) -> Self {
        Self {
            changed: true,
            details,
        }
    }
}

/// Edits a rule wants to make, with their report lines.
#[derive(Debug, Clone, Default)]
pub struct RulePlan {
    pub edits: Vec<Edit>,
    pub details: Vec<String>,
}

impl RulePlan {
    pub fn single(edit: Edit, detail: impl Into<String>) -> Self {
        Self {
            edits: vec![edit],
            details: vec![detail.into()],
        }
    }
}

/// One project-specific adaptation of generated text.
pub trait PatchRule {
    /// Stable rule name used in logs and listings.
    fn name(&self) -> &str;

    /// File name (not path) this rule applies to.
    fn target(&self) -> &str;

    /// Whether the adaptation is already present, or there is nothing to adapt.
    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError>;

    /// Compute the edits for a document where [`is_applied`](Self::is_applied) is false.
    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError>;

    fn applies_to(&self, path: &Path) -> bool {
        path.file_name().and_then(|name| name.to_str()) == Some(self.target())
    }

    /// Apply the rule to `doc` in memory.
    fn apply(&self, doc: &mut SourceDocument) -> Result<PatchResult, RuleError> {
        if self.is_applied(doc)? {
            debug!(rule = self.name(), file = %doc.path().display(), "already applied");
            return Ok(PatchResult::unchanged());
        }

        let plan = self.plan(doc)?;
        if doc.apply_edits(plan.edits)? {
            debug!(rule = self.name(), file = %doc.path().display(), "applied");
            Ok(PatchResult::changed(plan.details))
        } else {
            Ok(PatchResult::unchanged())
        }
    }
}

/// Resolve a landmark whose absence is fatal.
pub(crate) fn require_anchor(
    doc: &SourceDocument,
    landmark: &Landmark,
) -> Result<Anchor, AnchorError> {
    doc.anchor(landmark)?.ok_or_else(|| AnchorError::NotFound {
        landmark: landmark.to_string(),
    })
}

/// File name component of a configured target path.
fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The full ordered rule list for a project.
///
/// Order is fixed: header rules, then one local-pointer rule per function,
/// then the dot-access fix, then the data-file rename.
pub fn default_rules(
    targets: &Targets,
    symbols: &Symbols,
) -> Result<Vec<Box<dyn PatchRule>>, RuleError> {
    let header = file_name(&targets.header);
    let source = file_name(&targets.source);
    let data = file_name(&targets.data);

    let mut rules: Vec<Box<dyn PatchRule>> = vec![
        Box::new(GuardedIncludePatch::new(&header, symbols)),
        Box::new(DefaultParamFieldPatch::new(&header, symbols)),
        Box::new(ExternDeclCommentPatch::new(&header, symbols)?),
    ];

    for function in &symbols.functions {
        rules.push(Box::new(LocalParamPointerPatch::new(
            &source, function, symbols,
        )));
    }

    rules.push(Box::new(PointerDotAccessPatch::new(&source, symbols)?));
    rules.push(Box::new(ParamStructRenamePatch::new(&data, symbols)?));

    Ok(rules)
}
