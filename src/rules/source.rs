//! Rules for the generated model source file.

use crate::anchor::Landmark;
use crate::config::Symbols;
use crate::document::SourceDocument;
use crate::edit::Edit;
use crate::rules::{PatchRule, RuleError, RulePlan};
use regex::{escape, Regex};

/// Lines, starting at a function's brace line, searched for an existing
/// local parameter pointer. The search also stops at the function's closing
/// brace.
pub const IDEMPOTENCY_WINDOW: usize = 25;

/// Declares the local parameter pointer as the first statement of a model
/// entry point, so generated code reading `rtP->...` resolves per instance.
pub struct LocalParamPointerPatch {
    name: String,
    target: String,
    function: String,
    statement: String,
    landmark: Landmark,
}

impl LocalParamPointerPatch {
    pub fn new(target: &str, function: &str, symbols: &Symbols) -> Self {
        let p = &symbols.param_type;
        Self {
            name: format!("local-param-pointer:{function}"),
            target: target.to_string(),
            function: function.to_string(),
            statement: format!(
                "{p} *{} = (({p} *) {}->{});",
                symbols.param_var, symbols.model_var, symbols.param_field
            ),
            landmark: Landmark::FunctionBody {
                name: function.to_string(),
                model_type: symbols.model_type.clone(),
                model_var: symbols.model_var.clone(),
            },
        }
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }
}

impl PatchRule for LocalParamPointerPatch {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError> {
        // An absent function has nothing to adapt
        let Some(anchor) = doc.anchor(&self.landmark)? else {
            return Ok(true);
        };

        let text = doc.text();
        for (idx, line) in doc
            .lines()
            .iter()
            .skip(anchor.line)
            .take(IDEMPOTENCY_WINDOW)
            .enumerate()
        {
            let content = line.content(text);
            // Closing brace of this function; the next function's body is not ours
            if idx > 0 && content.starts_with('}') {
                break;
            }
            if content.contains(&self.statement) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError> {
        let Some(anchor) = doc.anchor(&self.landmark)? else {
            return Ok(RulePlan::default());
        };

        let newline = doc.newline();
        let line = format!("  {}{newline}", self.statement);
        let text = if anchor.at_line_start {
            line
        } else {
            format!("{newline}{line}")
        };

        Ok(RulePlan::single(
            Edit::insert(anchor.offset, text),
            format!("inserted local param pointer in {}()", self.function),
        ))
    }
}

/// Rewrites `alias.` into `alias->` for the parameter pointer names.
///
/// Only whole identifiers followed directly by `.` are touched; corrected
/// tokens no longer match, so repeated application is a no-op.
pub struct PointerDotAccessPatch {
    target: String,
    aliases: Vec<(String, Regex)>,
}

impl PointerDotAccessPatch {
    pub fn new(target: &str, symbols: &Symbols) -> Result<Self, RuleError> {
        let aliases = symbols
            .pointer_aliases
            .iter()
            .map(|alias| -> Result<(String, Regex), RuleError> {
                let re = Regex::new(&format!(r"\b{}\.", escape(alias)))?;
                Ok((alias.clone(), re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target: target.to_string(),
            aliases,
        })
    }
}

impl PatchRule for PointerDotAccessPatch {
    fn name(&self) -> &str {
        "pointer-dot-access"
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn is_applied(&self, doc: &SourceDocument) -> Result<bool, RuleError> {
        Ok(!self.aliases.iter().any(|(_, re)| re.is_match(doc.text())))
    }

    fn plan(&self, doc: &SourceDocument) -> Result<RulePlan, RuleError> {
        let mut plan = RulePlan::default();

        for (alias, re) in &self.aliases {
            let arrow = format!("{alias}->");
            let before = plan.edits.len();
            plan.edits.extend(
                re.find_iter(doc.text())
                    .map(|m| Edit::new(m.start(), m.end(), arrow.as_str(), m.as_str())),
            );

            let count = plan.edits.len() - before;
            if count > 0 {
                plan.details.push(format!(
                    "replaced {count} occurrence(s) of '{alias}.' with '{arrow}'"
                ));
            }
        }

        Ok(plan)
    }
}
