//! Caller claims forwarded by the API gateway.
//!
//! The gateway validates the token and passes the whole event, URL encoded,
//! in a request header. The claims live at `requestContext.authorizer.claims`.

use context::Claims;
use http::HeaderMap;
use serde::Deserialize;

pub(crate) const EVENT_HEADER: &str = "x-apigateway-event";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayEvent {
    request_context: Option<RequestContext>,
}

#[derive(Debug, Deserialize)]
struct RequestContext {
    authorizer: Option<Authorizer>,
}

#[derive(Debug, Deserialize)]
struct Authorizer {
    claims: Option<Claims>,
}

/// Claims of the caller, if the gateway forwarded any.
///
/// A malformed event is treated like a missing one.
pub(crate) fn from_headers(headers: &HeaderMap) -> Option<Claims> {
    let value = headers.get(EVENT_HEADER)?;

    let Ok(value) = value.to_str() else {
        log::warn!("Gateway event header is not valid ASCII");
        return None;
    };

    let decoded = match urlencoding::decode(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            log::warn!("Failed to decode gateway event header: {e}");
            return None;
        }
    };

    let event: GatewayEvent = match serde_json::from_str(&decoded) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Failed to parse gateway event: {e}");
            return None;
        }
    };

    event.request_context?.authorizer?.claims
}
