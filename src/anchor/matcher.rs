use crate::anchor::{Anchor, AnchorError, Landmark};
use crate::document::LineSpan;
use regex::{escape, Regex};
use tracing::{trace, warn};

/// Number of lines, starting at a function's signature line, searched for
/// its opening brace.
pub const BRACE_WINDOW: usize = 10;

/// Resolves [`Landmark`]s to edit points in raw text.
///
/// Stateless: a resolution is a pure function of the text. Callers that want
/// memoization go through [`SourceDocument::anchor`](crate::document::SourceDocument::anchor).
pub struct AnchorMatcher;

impl AnchorMatcher {
    /// Locate `landmark` in `text`.
    ///
    /// Returns `Ok(None)` only for optional landmarks (a function absent from
    /// this generator output). A required landmark that cannot be found is an
    /// error, as is a function whose opening brace is missing.
    pub fn resolve(
        text: &str,
        lines: &[LineSpan],
        landmark: &Landmark,
    ) -> Result<Option<Anchor>, AnchorError> {
        let found = match landmark {
            Landmark::GuardedIncludeBlock {
                guard,
                first_include,
            } => Self::guarded_include(text, lines, landmark, guard, first_include)?,
            Landmark::StructOpenBrace { tag } => Self::struct_open_brace(text, lines, landmark, tag)?,
            Landmark::FunctionBody {
                name,
                model_type,
                model_var,
            } => return Self::function_body(text, lines, landmark, name, model_type, model_var),
        };

        trace!(%landmark, ?found, "resolved landmark");

        match found {
            Some(anchor) => Ok(Some(anchor)),
            None => Err(AnchorError::NotFound {
                landmark: landmark.to_string(),
            }),
        }
    }

    fn guarded_include(
        text: &str,
        lines: &[LineSpan],
        landmark: &Landmark,
        guard: &str,
        first_include: &str,
    ) -> Result<Option<Anchor>, AnchorError> {
        let guard = escape(guard);
        let pattern = format!(
            r#"#ifndef\s+{guard}\s*\r?\n#define\s+{guard}\s*\r?\n#include\s+"{}"\s*\r?\n"#,
            escape(first_include)
        );
        let re = compile(&pattern, landmark)?;

        Ok(re.find(text).map(|m| Anchor {
            offset: m.end(),
            line: line_of(lines, m.end() - 1),
            at_line_start: true,
            approximate: false,
        }))
    }

    fn struct_open_brace(
        text: &str,
        lines: &[LineSpan],
        landmark: &Landmark,
        tag: &str,
    ) -> Result<Option<Anchor>, AnchorError> {
        let pattern = format!(r"struct\s+{}\s*\{{(?:[ \t]*\r?\n)?", escape(tag));
        let re = compile(&pattern, landmark)?;

        Ok(re.find(text).map(|m| {
            let at_line_start = m.as_str().ends_with('\n');
            Anchor {
                offset: m.end(),
                line: line_of(lines, m.end() - 1),
                at_line_start,
                approximate: false,
            }
        }))
    }

    fn function_body(
        text: &str,
        lines: &[LineSpan],
        landmark: &Landmark,
        name: &str,
        model_type: &str,
        model_var: &str,
    ) -> Result<Option<Anchor>, AnchorError> {
        let pattern = format!(
            r"^\s*void\s+{}\s*\(\s*{}\s*\*\s*const\s+{}\s*\)\s*$",
            escape(name),
            escape(model_type),
            escape(model_var)
        );
        let signature = compile(&pattern, landmark)?;

        let exact = lines
            .iter()
            .position(|line| signature.is_match(line.content(text)));

        let (sig, approximate) = match exact {
            Some(idx) => (idx, false),
            // Some generators put the brace on the signature line
            None => match lines.iter().position(|line| {
                let content = line.content(text);
                content.contains(name) && content.contains(model_type) && content.contains(model_var)
            }) {
                Some(idx) => (idx, true),
                None => {
                    trace!(function = name, "function not present");
                    return Ok(None);
                }
            },
        };

        if approximate {
            warn!(
                function = name,
                line = sig + 1,
                "signature located by fallback substring search"
            );
        }

        let end = lines.len().min(sig + BRACE_WINDOW);
        let brace = (sig..end)
            .find(|&idx| lines[idx].content(text).contains('{'))
            .ok_or_else(|| AnchorError::BraceNotFound {
                function: name.to_string(),
                window: BRACE_WINDOW,
            })?;

        let span = lines[brace];
        Ok(Some(Anchor {
            offset: span.next,
            line: brace,
            at_line_start: span.has_terminator(),
            approximate,
        }))
    }
}

fn compile(pattern: &str, landmark: &Landmark) -> Result<Regex, AnchorError> {
    Regex::new(pattern).map_err(|e| AnchorError::InvalidPattern {
        landmark: landmark.to_string(),
        message: e.to_string(),
    })
}

/// Index of the line containing byte `offset`.
fn line_of(lines: &[LineSpan], offset: usize) -> usize {
    lines
        .partition_point(|line| line.next <= offset)
        .min(lines.len().saturating_sub(1))
}
