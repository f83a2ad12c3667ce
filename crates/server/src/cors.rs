use config::CorsConfig;
use http::{HeaderName, HeaderValue, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Headers browsers may send to the endpoints.
const ALLOWED_HEADERS: [HeaderName; 4] = [
    header::ORIGIN,
    HeaderName::from_static("x-requested-with"),
    header::CONTENT_TYPE,
    header::ACCEPT,
];

pub(crate) fn layer(config: &CorsConfig) -> crate::Result<CorsLayer> {
    let allow_origin = match config.allow_origin.as_str() {
        "*" => AllowOrigin::any(),
        origin => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| crate::error::Error::Config(format!("invalid CORS origin {origin:?}: {e}")))?;

            AllowOrigin::exact(origin)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers(ALLOWED_HEADERS))
}
