use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::routes::AppState;

/// Serve the front-end bundle with single-page-app fallback.
///
/// Any path whose first segment starts with `api` reads as a missed API
/// route and returns 404 instead of the index document, so a typo'd
/// endpoint fails loudly rather than handing the client HTML.
pub async fn serve(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    if uri.path().trim_start_matches('/').starts_with("api") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let index = state.frontend_dir.join("index.html");
    let service = ServeDir::new(&state.frontend_dir).fallback(ServeFile::new(index));

    let mut request = Request::new(Body::empty());
    *request.method_mut() = method;
    *request.uri_mut() = uri;

    match service.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(err) => match err {},
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::routes::{router, AppState};
    use airgauge_ocr::{MockRecognizer, MonitorPipeline, Recognizer};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with_frontend(dir: &std::path::Path) -> AppState {
        let recognizer: Box<dyn Recognizer> = Box::new(MockRecognizer::empty());
        AppState {
            pipeline: Arc::new(MonitorPipeline::new(recognizer)),
            frontend_dir: dir.to_path_buf(),
        }
    }

    fn frontend_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>airgauge</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('aqi');").unwrap();
        dir
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn existing_asset_is_served() {
        let dir = frontend_fixture();
        let app = router(state_with_frontend(dir.path()));
        let response = app
            .oneshot(Request::builder().uri("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "console.log('aqi');");
    }

    #[tokio::test]
    async fn root_serves_index() {
        let dir = frontend_fixture();
        let app = router(state_with_frontend(dir.path()));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("airgauge"));
    }

    #[tokio::test]
    async fn missing_path_falls_back_to_index() {
        let dir = frontend_fixture();
        let app = router(state_with_frontend(dir.path()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/history/2026-08-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("airgauge"));
    }

    #[tokio::test]
    async fn api_prefixed_paths_never_fall_through_to_static() {
        let dir = frontend_fixture();
        let app = router(state_with_frontend(dir.path()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/definitely-missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_requests_to_static_paths_are_405() {
        let dir = frontend_fixture();
        let app = router(state_with_frontend(dir.path()));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
