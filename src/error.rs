// src/error.rs

use arrow::error::ArrowError;

/// Fatal errors raised by the prep stages.
///
/// Cell-level coercion problems and unmatched join keys are not errors: they become nulls
/// and dropped rows respectively, and are reported through `JoinStats`.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// A required column is absent after name normalization.
    #[error("{stage}: missing required column(s): {}", missing.join(", "))]
    SchemaMismatch {
        stage: &'static str,
        missing: Vec<String>,
    },

    /// The remote population/geography service failed or returned malformed data.
    #[error("retrieval from {url} failed: {reason}")]
    Retrieval { url: String, reason: String },

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl PrepError {
    pub fn retrieval(url: impl ToString, reason: impl ToString) -> Self {
        Self::Retrieval {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Alias for Result with `PrepError`
pub type Result<T> = std::result::Result<T, PrepError>;
