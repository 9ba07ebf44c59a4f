// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Headers set on every response. The API only serves JSON, so nothing may
/// be framed, embedded or loaded from it.
const STATIC_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    (
        "content-security-policy",
        "default-src 'none'; frame-ancestors 'none'",
    ),
    ("referrer-policy", "no-referrer"),
    (
        "permissions-policy",
        "camera=(), geolocation=(), microphone=(), payment=(), usb=()",
    ),
];

/// Add security headers to all responses.
///
/// Responses under `/api` and `/auth` carry member data or session tokens
/// and are additionally marked uncacheable.
pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let private = is_private_path(req.uri().path());
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in STATIC_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    if private {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}

fn is_private_path(path: &str) -> bool {
    ["/api", "/auth"]
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::{routing::get, Router};
    use tower::ServiceExt; // for oneshot

    fn app() -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/api/me", get(|| async { "{}" }))
            .layer(axum::middleware::from_fn(add_security_headers))
    }

    #[tokio::test]
    async fn test_security_headers() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(
            headers.get("Content-Security-Policy").unwrap(),
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert_eq!(headers.get("Referrer-Policy").unwrap(), "no-referrer");
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_api_responses_are_not_cached() {
        let response = app()
            .oneshot(Request::builder().uri("/api/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
    }

    #[test]
    fn test_private_paths() {
        assert!(is_private_path("/api/users"));
        assert!(is_private_path("/auth/login"));
        assert!(!is_private_path("/health"));
        assert!(!is_private_path("/apiary"));
    }
}
