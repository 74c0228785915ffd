//! Rules for the generated parameter data file.

use crate::config::Symbols;
use crate::document::SourceDocument;
use crate::edit::Edit;
use crate::rules::{PatchRule, RuleError, RulePlan};
use regex::{escape, Regex};

/// Renames the generated default parameter instance so each controller
/// instance can own its own parameter block.
///
/// Only the first top-level `TYPE OLD =` declaration is rewritten, and only
/// while no `TYPE NEW =` declaration exists yet.
pub struct ParamStructRenamePatch {
    target: String,
    old_name: String,
    new_name: String,
    detail: String,
    pattern: Regex,
    renamed: Regex,
}

impl ParamStructRenamePatch {
    pub fn new(target: &str, symbols: &Symbols) -> Result<Self, RuleError> {
        let pattern = Regex::new(&format!(
            r"(?mR)^[ \t]*{}\s+(?P<name>{})\s*=",
            escape(&symbols.param_type),
            escape(&symbols.param_var),
        ))?;
        let renamed = Regex::new(&format!(
            r"(?mR)^[ \t]*{}\s+{}\s*=",
            escape(&symbols.param_type),
            escape(&symbols.renamed_param_var),
        ))?;

        Ok(Self {
            target: target.to_string(),
            old_name: symbols.param_var.clone(),
            new_name: symbols.renamed_param_var.clone(),
            detail: format!(
                "renamed default params: '{p} {}' -> '{p} {}'",
                symbols.param_var,
                symbols.renamed_param_var,
                p = symbols.param_type,
            ),
            pattern,
            renamed,
        })
    }
}

impl PatchRule for ParamStructRenamePatch {
    fn name(&self) -> &str {
        "param-struct-rename"
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError> {
        let text = doc.text();
        Ok(self.renamed.is_match(text) || !self.pattern.is_match(text))
    }

    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError> {
        let Some(name) = self
            .pattern
            .captures(doc.text())
            .and_then(|caps| caps.name("name"))
        else {
            return Ok(RulePlan::default());
        };

        Ok(RulePlan::single(
            Edit::new(name.start(), name.end(), &self.new_name, &self.old_name),
            self.detail.clone(),
        ))
    }
}
