//! Structural landmarks in generated text.
//!
//! Generated files are not parsed. Instead each edit is pinned to a small set
//! of stable landmarks (an include-guard block, a struct's opening brace, a
//! function's opening brace) resolved with bounded pattern search.

pub mod errors;
pub mod landmark;
pub mod matcher;

pub use errors::AnchorError;
pub use landmark::{Anchor, Landmark};
pub use matcher::{AnchorMatcher, BRACE_WINDOW};
