use std::fmt;

/// A named structural landmark in generated C text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Landmark {
    /// `#ifndef GUARD` / `#define GUARD` / `#include "first_include"`.
    /// The edit point is right after the include line.
    GuardedIncludeBlock { guard: String, first_include: String },

    /// `struct TAG {`. The edit point is right after the brace line.
    StructOpenBrace { tag: String },

    /// `void NAME(MODEL_TYPE *const MODEL_VAR)` followed by its opening brace.
    /// The edit point is the start of the line after the brace.
    FunctionBody {
        name: String,
        model_type: String,
        model_var: String,
    },
}

impl Landmark {
    /// Whether failing to find this landmark is fatal.
    ///
    /// A missing function is a legitimate shape of generator output. The
    /// include block and struct always exist in a healthy header.
    pub fn is_required(&self) -> bool {
        !matches!(self, Landmark::FunctionBody { .. })
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Landmark::GuardedIncludeBlock { guard, .. } => write!(f, "{guard} block"),
            Landmark::StructOpenBrace { tag } => write!(f, "'struct {tag} {{'"),
            Landmark::FunctionBody { name, .. } => write!(f, "function {name}()"),
        }
    }
}

/// A resolved edit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Byte offset of the edit point
    pub offset: usize,
    /// Zero-based line holding the landmark's last token
    pub line: usize,
    /// Whether `offset` begins a fresh line
    pub at_line_start: bool,
    /// Found through the loose fallback search rather than the exact shape
    pub approximate: bool,
}
