use thiserror::Error;

/// Canonical result for core and the stage adapters.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad stage configuration, raised when the stage is built.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Unparseable predicate or field path.
    #[error("Expression error: {0}")]
    Expr(String),

    /// A stage that needs a sequence was handed a single value.
    #[error("Stage '{stage}' expects a sequence, got {found}")]
    NotASequence { stage: String, found: &'static str },

    /// A stage callback failed on an item.
    #[error("Stage '{stage}' failed: {message}")]
    Eval { stage: String, message: String },

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    pub fn eval(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Eval {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
