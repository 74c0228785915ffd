//! In-memory view of one generated file.
//!
//! A [`SourceDocument`] is read once, threaded through every rule for its
//! file, and written back only after all rules have run. Edits bump the
//! document revision, which drops the line index and every resolved anchor.

use crate::anchor::{Anchor, AnchorError, AnchorMatcher, Landmark};
use crate::edit::{apply_edits, Edit, EditError};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Line-ending style of a document, detected from its own content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// Any `\r\n` in the text makes the whole document CRLF.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Lf => write!(f, "LF"),
            LineEnding::CrLf => write!(f, "CRLF"),
        }
    }
}

/// Byte span of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// First byte of the line
    pub start: usize,
    /// End of the line content, excluding `\r\n` / `\n`
    pub end: usize,
    /// First byte of the following line (or text length)
    pub next: usize,
}

impl LineSpan {
    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn has_terminator(&self) -> bool {
        self.next > self.end
    }
}

/// Split `text` into line spans. A trailing newline does not open an empty line.
pub fn index_lines(text: &str) -> Vec<LineSpan> {
    let mut lines = Vec::new();
    let mut start = 0;

    for (pos, _) in text.match_indices('\n') {
        let end = if pos > start && text.as_bytes()[pos - 1] == b'\r' {
            pos - 1
        } else {
            pos
        };
        lines.push(LineSpan {
            start,
            end,
            next: pos + 1,
        });
        start = pos + 1;
    }

    if start < text.len() {
        lines.push(LineSpan {
            start,
            end: text.len(),
            next: text.len(),
        });
    }

    lines
}

/// A generated file's full text plus its detected line-ending style.
#[derive(Debug)]
pub struct SourceDocument {
    path: PathBuf,
    original: String,
    text: String,
    line_ending: LineEnding,
    revision: u64,
    lines: OnceCell<Vec<LineSpan>>,
    anchors: RefCell<HashMap<Landmark, Result<Option<Anchor>, AnchorError>>>,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            path: path.into(),
            line_ending: LineEnding::detect(&text),
            original: text.clone(),
            text,
            revision: 0,
            lines: OnceCell::new(),
            anchors: RefCell::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text, including every edit applied so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text as it was when the document was created.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Newline sequence to use for inserted text.
    pub fn newline(&self) -> &'static str {
        self.line_ending.as_str()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_modified(&self) -> bool {
        self.text != self.original
    }

    pub fn lines(&self) -> &[LineSpan] {
        self.lines.get_or_init(|| index_lines(&self.text))
    }

    /// Resolve a landmark against the current revision.
    ///
    /// Resolutions are memoized until the next edit.
    pub fn anchor(&self, landmark: &Landmark) -> Result<Option<Anchor>, AnchorError> {
        if let Some(cached) = self.anchors.borrow().get(landmark) {
            return cached.clone();
        }

        let resolved = AnchorMatcher::resolve(&self.text, self.lines(), landmark);
        self.anchors
            .borrow_mut()
            .insert(landmark.clone(), resolved.clone());
        resolved
    }

    /// Apply a batch of edits. Returns whether the text changed.
    pub fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<bool, EditError> {
        if edits.is_empty() {
            return Ok(false);
        }

        let new_text = apply_edits(&self.text, edits)?;
        if new_text == self.text {
            return Ok(false);
        }

        self.replace_text(new_text);
        Ok(true)
    }

    /// Replace the whole text, invalidating derived indexes.
    pub fn replace_text(&mut self, text: String) {
        self.text = text;
        self.revision += 1;
        self.lines = OnceCell::new();
        self.anchors.get_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_line_ending() {
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("no newline"), LineEnding::Lf);
    }

    #[test]
    fn test_index_lines_lf() {
        let text = "ab\ncd\n";
        let lines = index_lines(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content(text), "ab");
        assert_eq!(lines[1].content(text), "cd");
        assert_eq!(lines[1].next, text.len());
    }

    #[test]
    fn test_index_lines_crlf_and_unterminated_tail() {
        let text = "ab\r\ncd";
        let lines = index_lines(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content(text), "ab");
        assert!(lines[0].has_terminator());
        assert_eq!(lines[1].content(text), "cd");
        assert!(!lines[1].has_terminator());
    }

    #[test]
    fn test_apply_edits_bumps_revision() {
        let mut doc = SourceDocument::new("x.c", "int a;\n");
        let _ = doc.lines();
        assert!(doc.apply_edits(vec![Edit::insert(0, "int b;\n")]).unwrap());
        assert_eq!(doc.revision(), 1);
        assert_eq!(doc.lines().len(), 2);
        assert!(doc.is_modified());
        assert_eq!(doc.original(), "int a;\n");
    }

    #[test]
    fn test_noop_edit_keeps_revision() {
        let mut doc = SourceDocument::new("x.c", "int a;\n");
        let changed = doc.apply_edits(vec![Edit::new(0, 3, "int", "int")]).unwrap();
        assert!(!changed);
        assert_eq!(doc.revision(), 0);
    }
}
