//! Extraction of request parameters.

use axum::http::{HeaderMap, header::CONTENT_TYPE};
use context::Claims;
use directory::PageRequest;
use serde::Deserialize;

use crate::error::{GroupError, GroupResult};

/// Page size used when the caller does not ask for one.
pub(crate) const DEFAULT_PAGE_LIMIT: u32 = 25;

/// Query of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub groupname: Option<String>,
    pub limit: Option<String>,
    pub token: Option<String>,
}

impl ListQuery {
    /// Build the page request.
    ///
    /// A supplied limit is always forwarded, with or without a cursor. Without
    /// one, [`DEFAULT_PAGE_LIMIT`] applies. An empty cursor counts as none.
    pub fn page(&self) -> GroupResult<PageRequest> {
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PAGE_LIMIT,
            Some(limit) => match limit.parse::<u32>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(GroupError::Validation("limit must be a positive integer".to_string())),
            },
        };

        let token = self.token.clone().filter(|token| !token.is_empty());

        Ok(PageRequest {
            limit: Some(limit),
            token,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct GroupNameBody {
    groupname: Option<String>,
}

/// How a request body is decoded, from its media type.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyKind {
    Form,
    Json,
    Other,
}

impl BodyKind {
    fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) else {
            return Self::Other;
        };

        let media_type = value.split(';').next().unwrap_or_default().trim();

        if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Self::Form
        } else if media_type.eq_ignore_ascii_case("application/json")
            || media_type.to_ascii_lowercase().ends_with("+json")
        {
            Self::Json
        } else {
            Self::Other
        }
    }
}

/// Read `groupname` from a JSON or URL encoded body.
///
/// An empty body has no group name, and neither has a body of any other media type.
pub(crate) fn group_name(headers: &HeaderMap, body: &[u8]) -> GroupResult<String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }

    match BodyKind::from_headers(headers) {
        BodyKind::Form => {
            let name = url::form_urlencoded::parse(body)
                .find(|(key, _)| key == "groupname")
                .map(|(_, value)| value.into_owned());

            Ok(name.unwrap_or_default())
        }
        BodyKind::Json => {
            let body: GroupNameBody = serde_json::from_slice(body).map_err(|e| {
                log::debug!("Failed to parse request body: {e}");
                GroupError::Validation(format!("Invalid request body: {e}"))
            })?;

            Ok(body.groupname.unwrap_or_default())
        }
        BodyKind::Other => {
            log::debug!("Ignoring request body without a JSON or form content type");
            Ok(String::new())
        }
    }
}

/// The username of the caller, from the claims attached by the authorizer.
pub(crate) fn caller_username(claims: Option<&Claims>) -> GroupResult<String> {
    claims
        .and_then(Claims::username)
        .map(str::to_string)
        .ok_or(GroupError::Unauthenticated)
}
