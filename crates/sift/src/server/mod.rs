//! HTTP relay: routes, shared state and middleware.

mod handlers;
pub mod types;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sift_core::config::ServerConfig;
use sift_core::AnalysisService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the relay router over a shared service.
///
/// Handlers read the caller address through `ConnectInfo`, so the router
/// must be served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(service: Arc<AnalysisService>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/compareAnalyze", post(handlers::compare_analyze))
        .route("/ask", post(handlers::ask))
        .route("/status", get(handlers::status))
        .route("/check", get(handlers::check))
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::types::ErrorResponse;
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use sift_core::llm::{LlmRequest, LlmResponse};
    use sift_core::{Config, LlmProvider, ProviderError, ProviderKind};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "sift-test-boundary";
    const LABEL_REPLY: &str = "```json\n{\"production_date\": \"02/01/2025\", \"expiration_date\": \"02/01/2026\", \"production_id\": \"B7\", \"additional_info\": null}\n```";

    struct StubProvider {
        name: &'static str,
        reply: Result<&'static str, u16>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            "stub"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.to_string(),
                    model: "stub".to_string(),
                    tokens_used: None,
                    latency_ms: 0,
                }),
                Err(status) => Err(ProviderError::Api {
                    provider: self.name.to_string(),
                    message: if status == 429 {
                        "RESOURCE_EXHAUSTED".to_string()
                    } else {
                        "upstream failure".to_string()
                    },
                    status_code: Some(status),
                }),
            }
        }

        async fn stream(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            self.generate(request).await
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    struct Harness {
        app: Router,
        calls: Arc<AtomicU32>,
    }

    fn harness(stubs: Vec<(ProviderKind, Result<&'static str, u16>)>, config: Config) -> Harness {
        let calls = Arc::new(AtomicU32::new(0));
        let providers = stubs
            .into_iter()
            .map(|(kind, reply)| {
                let stub = StubProvider {
                    name: kind.as_str(),
                    reply,
                    calls: calls.clone(),
                };
                (kind, Arc::new(stub) as Arc<dyn LlmProvider>)
            })
            .collect();
        let service = Arc::new(AnalysisService::new(providers, &config));
        let app = router(service, &config.server)
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        Harness { app, calls }
    }

    fn default_harness() -> Harness {
        harness(
            vec![
                (ProviderKind::Gemini, Ok(LABEL_REPLY)),
                (ProviderKind::Groq, Ok(LABEL_REPLY)),
            ],
            Config::default(),
        )
    }

    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(12, 12, image::Rgb([90, 120, 200]));
        let mut cursor = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn multipart(path: &str, image: Option<&[u8]>, model: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(model) = model {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"model\"\r\n\r\n{model}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(image) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"label.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(image);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn ask_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_returns_extracted_fields() {
        let h = default_harness();
        let response = h
            .app
            .oneshot(multipart("/analyze", Some(&png()), Some("groq")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"]["production_id"], "B7");
        assert_eq!(body["data"]["expiration_date"], "02/01/2026");
        assert!(body["data"]["additional_info"].is_null());
    }

    #[tokio::test]
    async fn test_analyze_without_file_is_400_and_skips_provider() {
        let h = default_harness();
        let response = h
            .app
            .oneshot(multipart("/analyze", None, Some("gemini")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = serde_json::from_value(json(response).await).unwrap();
        assert_eq!(body.status, 400);
        assert_eq!(body.code, "MISSING_IMAGE");
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_unknown_model_is_400_and_skips_provider() {
        let h = default_harness();
        let response = h
            .app
            .oneshot(multipart("/analyze", Some(&png()), Some("llava")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["code"], "UNKNOWN_MODEL");
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_rejects_non_multipart_body() {
        let h = default_harness();
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_compare_null_fills_failed_provider() {
        let h = harness(
            vec![
                (ProviderKind::Gemini, Err(500)),
                (ProviderKind::Groq, Ok(LABEL_REPLY)),
            ],
            Config::default(),
        );
        let response = h
            .app
            .oneshot(multipart("/compareAnalyze", Some(&png()), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["models"], serde_json::json!(["gemini", "groq"]));
        let datas = body["datas"].as_array().unwrap();
        assert_eq!(datas.len(), 2);
        assert!(datas[0]["production_id"].is_null());
        assert!(datas[0]["production_date"].is_null());
        assert_eq!(datas[1]["production_id"], "B7");
    }

    #[tokio::test]
    async fn test_ask_distinguishes_upstream_rate_limit() {
        let h = harness(
            vec![
                (ProviderKind::Gemini, Err(429)),
                (ProviderKind::Groq, Err(502)),
            ],
            Config::default(),
        );

        let limited = h
            .app
            .clone()
            .oneshot(ask_request(serde_json::json!({"prompt": "hi", "model": "gemini"})))
            .await
            .unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json(limited).await["code"], "PROVIDER_RATE_LIMITED");

        let failed = h
            .app
            .oneshot(ask_request(serde_json::json!({"prompt": "hi", "model": "groq"})))
            .await
            .unwrap();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(failed).await["code"], "PROVIDER_ERROR");
    }

    #[tokio::test]
    async fn test_ask_returns_response_text() {
        let h = harness(
            vec![(ProviderKind::Groq, Ok("forty-two"))],
            Config::default(),
        );
        // No model: first served provider
        let response = h
            .app
            .oneshot(ask_request(serde_json::json!({"prompt": "meaning of life?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"]["response"], "forty-two");
    }

    #[tokio::test]
    async fn test_ask_without_prompt_is_400() {
        let h = default_harness();
        let response = h
            .app
            .oneshot(ask_request(serde_json::json!({"model": "gemini"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "MISSING_PROMPT");
    }

    #[tokio::test]
    async fn test_local_rate_limit_rejects_after_cap() {
        let mut config = Config::default();
        config.rate_limit.max_requests = 2;
        let h = harness(vec![(ProviderKind::Groq, Ok("ok"))], config);

        for _ in 0..2 {
            let response = h
                .app
                .clone()
                .oneshot(ask_request(serde_json::json!({"prompt": "hi"})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = h
            .app
            .clone()
            .oneshot(ask_request(serde_json::json!({"prompt": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(json(response).await["code"], "RATE_LIMITED");
        assert_eq!(h.calls.load(Ordering::SeqCst), 2);

        // GET endpoints are not capped
        let status = h.app.oneshot(get("/status")).await.unwrap();
        assert_eq!(status.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_reports_counters() {
        let h = default_harness();
        h.app
            .clone()
            .oneshot(multipart("/analyze", None, None))
            .await
            .unwrap();
        h.app
            .clone()
            .oneshot(ask_request(serde_json::json!({"prompt": "hi"})))
            .await
            .unwrap();

        let response = h.app.oneshot(get("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["models"], serde_json::json!(["gemini", "groq"]));
        assert_eq!(body["requests"]["analyze"], 1);
        assert_eq!(body["requests"]["ask"], 1);
        assert_eq!(body["requests"]["status"], 1);
        assert_eq!(body["requests"]["total"], 3);
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_check_serves_upload_form() {
        let h = default_harness();
        let response = h.app.oneshot(get("/check")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("name=\"image\""));
    }
}
