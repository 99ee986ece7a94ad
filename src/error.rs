use thiserror::Error;

#[derive(Error, Debug)]
pub enum CcgError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Grammar error: {message}")]
    Grammar { message: String },
    #[error("Category parse error: {message}")]
    CategoryParse { message: String, position: Option<usize> },
    #[error("Resource exceeded: {0}")]
    ResourceExceeded(String),
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl CcgError {
    /// Resource exhaustion only costs the current sentence, anything else
    /// means the grammar or the chart can no longer be trusted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CcgError::ResourceExceeded(_))
    }
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
    pub(crate) fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, CcgError>;

// Helper conversions
impl From<config::ConfigError> for CcgError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
