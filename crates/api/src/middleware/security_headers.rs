//! Security headers middleware.
//!
//! Adds security-related HTTP headers to all responses.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Header policy, built once from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SecurityHeaders {
    /// Only enable behind real TLS termination.
    pub hsts: bool,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            hsts: config.hsts_enabled,
        }
    }
}

/// Middleware that adds security headers to all responses.
///
/// Headers added:
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Referrer-Policy: same-origin`
/// - `Cache-Control: no-store`, unless the handler set its own
/// - `Strict-Transport-Security` when enabled in configuration
pub async fn security_headers_middleware(
    State(policy): State<SecurityHeaders>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("same-origin"),
    );

    // Pages carry per-user data.
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    if policy.hsts {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn call(policy: SecurityHeaders, router: Router) -> Response {
        router
            .layer(middleware::from_fn_with_state(
                policy,
                security_headers_middleware,
            ))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_headers_added() {
        let router = Router::new().route("/", get(|| async { "ok" }));
        let response = call(SecurityHeaders { hsts: false }, router).await;
        let headers = response.headers();

        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "same-origin");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_hsts_when_enabled() {
        let router = Router::new().route("/", get(|| async { "ok" }));
        let response = call(SecurityHeaders { hsts: true }, router).await;

        assert_eq!(
            response.headers()[header::STRICT_TRANSPORT_SECURITY],
            HSTS_VALUE
        );
    }

    #[tokio::test]
    async fn test_handler_cache_control_kept() {
        let router = Router::new().route(
            "/",
            get(|| async { ([(header::CACHE_CONTROL, "max-age=60")], "ok") }),
        );
        let response = call(SecurityHeaders { hsts: false }, router).await;

        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=60");
    }

    #[test]
    fn test_from_config() {
        let config = SecurityConfig {
            cors_origins: vec![],
            hsts_enabled: true,
        };
        assert!(SecurityHeaders::from_config(&config).hsts);
    }
}
