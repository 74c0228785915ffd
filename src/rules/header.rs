//! Rules for the generated model header.

use crate::anchor::Landmark;
use crate::config::Symbols;
use crate::document::SourceDocument;
use crate::edit::Edit;
use crate::rules::{require_anchor, PatchRule, RuleError, RulePlan};
use regex::{escape, Regex};

/// Makes the header resolve the target-selection macro regardless of
/// include order, by including the project config right after the
/// generator's first system include.
pub struct GuardedIncludePatch {
    target: String,
    guard_macro: String,
    config_header: String,
    landmark: Landmark,
}

impl GuardedIncludePatch {
    pub fn new(target: &str, symbols: &Symbols) -> Self {
        Self {
            target: target.to_string(),
            guard_macro: symbols.config_guard_macro.clone(),
            config_header: symbols.config_header.clone(),
            landmark: Landmark::GuardedIncludeBlock {
                guard: symbols.common_includes_guard.clone(),
                first_include: symbols.first_include.clone(),
            },
        }
    }

    fn guarded_include(&self, newline: &str) -> String {
        format!(
            "#ifndef {macro_}{newline}#include \"{header}\"{newline}#endif",
            macro_ = self.guard_macro,
            header = self.config_header,
        )
    }
}

impl PatchRule for GuardedIncludePatch {
    fn name(&self) -> &str {
        "guarded-include"
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError> {
        Ok(doc.text().contains(&self.guarded_include(doc.newline())))
    }

    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError> {
        let anchor = require_anchor(doc, &self.landmark)?;
        let newline = doc.newline();
        let mut block = self.guarded_include(newline);
        block.push_str(newline);

        Ok(RulePlan::single(
            Edit::insert(anchor.offset, block),
            format!(
                "added guarded include for {} ({})",
                self.config_header, self.guard_macro
            ),
        ))
    }
}

/// Adds the default-parameter pointer field to the model struct.
pub struct DefaultParamFieldPatch {
    target: String,
    model_type: String,
    field: String,
    declaration: String,
    landmark: Landmark,
}

impl DefaultParamFieldPatch {
    pub fn new(target: &str, symbols: &Symbols) -> Self {
        Self {
            target: target.to_string(),
            model_type: symbols.model_type.clone(),
            field: symbols.param_field.clone(),
            declaration: format!("{} *{};", symbols.param_type, symbols.param_field),
            landmark: Landmark::StructOpenBrace {
                tag: symbols.model_struct_tag.clone(),
            },
        }
    }
}

impl PatchRule for DefaultParamFieldPatch {
    fn name(&self) -> &str {
        "default-param-field"
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError> {
        Ok(doc.text().contains(&self.declaration))
    }

    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError> {
        let anchor = require_anchor(doc, &self.landmark)?;
        let newline = doc.newline();
        let line = format!("  {}{newline}", self.declaration);
        let text = if anchor.at_line_start {
            line
        } else {
            format!("{newline}{line}")
        };

        Ok(RulePlan::single(
            Edit::insert(anchor.offset, text),
            format!("added {}::{}", self.model_type, self.field),
        ))
    }
}

/// Comments out the global parameter-block extern; instances reach their
/// parameters through the model pointer instead.
pub struct ExternDeclCommentPatch {
    target: String,
    replacement: String,
    detail: String,
    pattern: Regex,
}

impl ExternDeclCommentPatch {
    pub fn new(target: &str, symbols: &Symbols) -> Result<Self, RuleError> {
        // CRLF mode keeps `$` in front of `\r\n`
        let pattern = Regex::new(&format!(
            r"(?mR)^(?P<indent>[ \t]*)extern[ \t]+{}[ \t]+{}[ \t]*;[ \t]*$",
            escape(&symbols.param_type),
            escape(&symbols.param_var),
        ))?;
        let declaration = format!("extern {} {};", symbols.param_type, symbols.param_var);

        Ok(Self {
            target: target.to_string(),
            replacement: format!("//{declaration}"),
            detail: format!(
                "commented out '{declaration}' (use {}->{})",
                symbols.model_var, symbols.param_field
            ),
            pattern,
        })
    }
}

impl PatchRule for ExternDeclCommentPatch {
    fn name(&self) -> &str {
        "extern-decl-comment"
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError> {
        Ok(!self.pattern.is_match(doc.text()))
    }

    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError> {
        let edits: Vec<Edit> = self
            .pattern
            .captures_iter(doc.text())
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let indent = caps.name("indent").map_or("", |m| m.as_str());
                Some(Edit::new(
                    whole.start(),
                    whole.end(),
                    format!("{indent}{}", self.replacement),
                    whole.as_str(),
                ))
            })
            .collect();

        let details = if edits.is_empty() {
            Vec::new()
        } else {
            vec![self.detail.clone()]
        };

        Ok(RulePlan { edits, details })
    }
}
