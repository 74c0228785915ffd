//! Human-readable run summary. Pure formatting; no decisions are made here.

use crate::engine::FileEdit;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Title { dry_run: bool },
    Patched { path: String },
    Detail(String),
    Ok { path: String },
    NothingChanged,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Title { dry_run: false } => write!(f, "Post-gen patch summary:"),
            ReportLine::Title { dry_run: true } => write!(f, "Post-gen patch summary (dry run):"),
            ReportLine::Patched { path } => write!(f, "- patched {path}"),
            ReportLine::Detail(detail) => write!(f, "  - {detail}"),
            ReportLine::Ok { path } => write!(f, "- ok      {path}"),
            ReportLine::NothingChanged => write!(f, "No changes needed."),
        }
    }
}

/// One status line per file, details indented under patched files, and a
/// closing note when nothing changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    lines: Vec<ReportLine>,
}

impl ChangeReport {
    /// Build the report. Paths are shown relative to `root` when possible.
    pub fn new(edits: &[FileEdit], root: &Path, dry_run: bool) -> Self {
        let mut lines = vec![ReportLine::Title { dry_run }];

        for edit in edits {
            let path = edit
                .path
                .strip_prefix(root)
                .unwrap_or(&edit.path)
                .display()
                .to_string();

            if edit.changed {
                lines.push(ReportLine::Patched { path });
                lines.extend(edit.details.iter().cloned().map(ReportLine::Detail));
            } else {
                lines.push(ReportLine::Ok { path });
            }
        }

        if !edits.iter().any(|edit| edit.changed) {
            lines.push(ReportLine::NothingChanged);
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }
}

impl fmt::Display for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
