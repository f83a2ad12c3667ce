use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{body::Body, response::IntoResponse};
use config::AccessConfig;
use http::{Request, Response};
use tower::Layer;

use super::{claims, gate::Gate};

/// Reads the caller claims from the gateway event and enforces the admin group.
///
/// Claims that pass the gate are available to handlers as a request extension.
#[derive(Clone)]
pub struct AuthLayer(Arc<Gate>);

impl AuthLayer {
    pub fn new(access: &AccessConfig, exempt_paths: &[&str]) -> Self {
        Self(Arc::new(Gate::new(access, exempt_paths)))
    }
}

impl<Service> Layer<Service> for AuthLayer
where
    Service: Send + Clone,
{
    type Service = AuthService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        AuthService {
            next,
            gate: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService<Service> {
    next: Service,
    gate: Arc<Gate>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for AuthService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let gate = self.gate.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let claims = claims::from_headers(&parts.headers);

            if let Err(error) = gate.authorize(parts.uri.path(), claims.as_ref()) {
                return Ok(error.into_response());
            }

            if let Some(claims) = claims {
                parts.extensions.insert(claims);
            }

            next.call(Request::from_parts(parts, body)).await
        })
    }
}
