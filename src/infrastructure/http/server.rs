//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::HeaderName;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::dto::headers;
use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建带全部中间件的 Router
    pub fn router(&self) -> Router {
        // 浏览器端需要读取朗读统计头
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers([
                HeaderName::from_static(headers::SEGMENTS),
                HeaderName::from_static(headers::OMITTED),
                HeaderName::from_static(headers::DURATION_MS),
            ])
            .max_age(Duration::from_secs(3600));

        create_routes(&self.config.static_files)
            .layer(DefaultBodyLimit::max(self.config.max_upload_size))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器，`shutdown_signal` 完成后优雅关闭
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let addr = self.config.addr();

        tracing::info!(
            addr = %addr,
            max_upload_size = self.config.max_upload_size,
            "Starting HTTP server (with graceful shutdown)"
        );

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::application::ports::MergeConfig;
    use crate::application::{GenerateStoryHandler, NarrateStoryHandler, SegmentSynthesizer};
    use crate::config::AppConfig;
    use crate::infrastructure::adapters::{FakeInferenceClient, WavMerger};

    fn server(max_upload_size: usize) -> HttpServer {
        let client = Arc::new(FakeInferenceClient::with_defaults());
        let state = AppState::new(
            GenerateStoryHandler::new(client.clone()),
            NarrateStoryHandler::new(
                SegmentSynthesizer::new(client, 3),
                Arc::new(WavMerger::new()),
                MergeConfig::default(),
            ),
        );
        let mut config = AppConfig::default().server;
        config.max_upload_size = max_upload_size;
        HttpServer::new(config, state)
    }

    #[tokio::test]
    async fn test_cors_exposes_narration_headers() {
        let response = server(1024)
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/ping")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let exposed = response
            .headers()
            .get("access-control-expose-headers")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(exposed.contains(headers::SEGMENTS));
        assert!(exposed.contains(headers::OMITTED));
    }

    #[tokio::test]
    async fn test_upload_limit_applies() {
        let body = serde_json::json!({ "story": "x".repeat(256) }).to_string();
        let response = server(64)
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/story/narration")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
