//! API Routes
//!
//! Configures the Axum router: every path falls through to the proxy
//! handler, and every response carries the fixed CORS header set.

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderName, HeaderValue,
    },
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use super::handlers::{proxy_handler, AppState};

/// Cross-origin headers applied to every response, overriding upstream values.
pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        ACCESS_CONTROL_ALLOW_METHODS,
        "GET, POST, PUT, DELETE, OPTIONS",
    ),
    (
        ACCESS_CONTROL_ALLOW_HEADERS,
        "Content-Type, Access-Control-Allow-Headers, Authorization, X-Requested-With",
    ),
];

/// Creates the main router.
///
/// # Middleware
/// - CORS: one overriding header layer per CORS header, so proxied,
///   preflight and error responses all carry the same set
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let router: Router<AppState> = Router::new().fallback(proxy_handler);

    CORS_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ))
        })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    async fn create_test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store_root: dir.path().join("cache"),
            upstream_url: "http://127.0.0.1:9/api".to_string(),
            ..Config::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        (dir, create_router(state))
    }

    fn assert_cors(headers: &axum::http::HeaderMap) {
        for (name, value) in CORS_HEADERS {
            assert_eq!(headers[&name], value, "header {}", name);
        }
    }

    #[tokio::test]
    async fn test_options_endpoint() {
        let (_dir, app) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/any/path")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(response.headers());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (_dir, app) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/blocks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(response.headers());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let (_dir, app) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/blocks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(response.headers());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Error fetching the URL.");
    }
}
