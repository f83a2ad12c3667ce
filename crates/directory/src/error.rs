use thiserror::Error;

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Failure reported by, or while reaching, the identity directory.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The directory rejected the call. Kept exactly as the directory reported it.
    #[error("{message}")]
    Service {
        /// Error code, e.g. `ResourceNotFoundException`.
        code: Option<String>,
        message: String,
        /// HTTP status of the directory response.
        status: Option<u16>,
    },

    /// The directory could not be reached or answered with something unreadable.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl DirectoryError {
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => code.as_deref(),
            Self::Connection(_) => None,
        }
    }

    /// HTTP status the directory answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => *status,
            Self::Connection(_) => None,
        }
    }
}
