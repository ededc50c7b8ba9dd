/// Response hardening headers
///
/// Every response, errors included, carries the same fixed set of headers.
/// The API only ever returns JSON, so the content policy forbids loading
/// anything at all and responses are never cached (they carry user data).
///
/// ```text
/// X-Content-Type-Options     nosniff
/// X-Frame-Options            DENY
/// Referrer-Policy            no-referrer
/// Permissions-Policy         camera=(), microphone=(), geolocation=(), payment=()
/// Content-Security-Policy    default-src 'none'; frame-ancestors 'none'
/// Cache-Control              no-store
/// Strict-Transport-Security  max-age=31536000; includeSubDomains   (production)
/// ```
///
/// ```no_run
/// use axum::Router;
/// use coordinator_api::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new().layer(SecurityHeadersLayer::new(true));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    response::Response,
};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

type HeaderSet = Arc<[(HeaderName, HeaderValue)]>;

fn header_set(hsts: bool) -> HeaderSet {
    let mut headers = vec![
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
        ),
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
    ];

    if hsts {
        headers.push((
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ));
    }

    headers.into()
}

#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: HeaderSet,
}

impl SecurityHeadersLayer {
    /// `production` adds HSTS, which only makes sense behind TLS
    pub fn new(production: bool) -> Self {
        Self {
            headers: header_set(production),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    headers: HeaderSet,
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let headers = Arc::clone(&self.headers);

        Box::pin(async move {
            let mut response = future.await?;
            let target = response.headers_mut();

            for (name, value) in headers.iter() {
                target.insert(name.clone(), value.clone());
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn headers_for(production: bool, uri: &str) -> (StatusCode, axum::http::HeaderMap) {
        let app = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .layer(SecurityHeadersLayer::new(production));

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        (response.status(), response.headers().clone())
    }

    #[tokio::test]
    async fn test_headers_applied() {
        let (_, headers) = headers_for(false, "/ok").await;

        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["cache-control"], "no-store");
        assert!(headers.contains_key("content-security-policy"));
        assert!(headers.contains_key("permissions-policy"));
    }

    #[tokio::test]
    async fn test_headers_on_fallback_response() {
        let (status, headers) = headers_for(false, "/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_hsts_only_in_production() {
        let (_, production) = headers_for(true, "/ok").await;
        let (_, development) = headers_for(false, "/ok").await;

        assert!(production.contains_key("strict-transport-security"));
        assert!(!development.contains_key("strict-transport-security"));
    }
}
