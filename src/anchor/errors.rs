use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("could not find {landmark}")]
    NotFound { landmark: String },

    #[error("could not locate opening '{{' for {function}() within {window} lines of its signature")]
    BraceNotFound { function: String, window: usize },

    #[error("invalid anchor pattern for {landmark}: {message}")]
    InvalidPattern { landmark: String, message: String },
}
