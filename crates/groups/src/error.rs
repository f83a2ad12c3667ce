use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use directory::DirectoryError;
use serde::Serialize;
use thiserror::Error;

pub type GroupResult<T> = std::result::Result<T, GroupError>;

/// Errors of the group administration endpoints, with their HTTP status codes.
#[derive(Debug, Error)]
pub enum GroupError {
    /// A required parameter is missing or malformed. No directory call was made.
    #[error("{0}")]
    Validation(String),

    /// The caller is not a member of the administrator group.
    #[error("User does not have permissions to perform administrative tasks")]
    Forbidden,

    /// A self-scoped operation was called without a username claim.
    #[error("Caller identity does not contain a username")]
    Unauthenticated,

    /// The existence check of create-and-join failed for another reason than
    /// the group not existing.
    #[error("Failed to look up group {group}: {source}")]
    GroupLookup {
        group: String,
        #[source]
        source: DirectoryError,
    },

    /// Creating the group in create-and-join failed.
    #[error("Failed to create group {group}: {source}")]
    GroupCreation {
        group: String,
        #[source]
        source: DirectoryError,
    },

    /// A directory call failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl GroupError {
    /// Get the appropriate HTTP status code for this error.
    ///
    /// Directory errors keep the status the directory answered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::GroupLookup { source, .. } | Self::GroupCreation { source, .. } | Self::Directory(source) => source
                .status()
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Message that is safe to expose to API consumers.
    ///
    /// Connection failures are internal and are not described to the caller.
    pub fn client_message(&self) -> String {
        match self {
            Self::GroupLookup {
                source: DirectoryError::Connection(_),
                ..
            }
            | Self::GroupCreation {
                source: DirectoryError::Connection(_),
                ..
            }
            | Self::Directory(DirectoryError::Connection(_)) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for GroupError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("Request failed with {status}: {self}");
        }

        let error_response = ErrorResponse {
            message: self.client_message(),
        };

        (status, Json(error_response)).into_response()
    }
}
