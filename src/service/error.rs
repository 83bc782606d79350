use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure kinds the lifecycle engine reports to transport adapters.
#[derive(Debug, Error)]
pub enum FileError {
    /// Malformed or out-of-policy input. Retrying the same request won't help.
    #[error("invalid input data: {0}")]
    InvalidInput(String),
    #[error("file id is required")]
    FileIdRequired,
    /// Missing or soft-deleted.
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("access denied")]
    AccessDenied,
    /// A collaborator (store or URL issuer) failed. `source` is for logs only.
    #[error("internal error: {context}")]
    Internal {
        context: &'static str,
        #[source]
        source: BoxError,
    },
}

impl FileError {
    pub(crate) fn internal<E>(context: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        FileError::Internal {
            context,
            source: source.into(),
        }
    }
}
