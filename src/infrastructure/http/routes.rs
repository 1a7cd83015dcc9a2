//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/story             POST  上传图片生成故事与话题标签（multipart）
//! - /api/story/narration   POST  朗读故事，返回音频

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use super::handlers;
use super::state::AppState;
use crate::config::StaticFilesConfig;

/// 创建所有路由
pub fn create_routes(static_files: &StaticFilesConfig) -> Router<Arc<AppState>> {
    let router = Router::new().nest("/api", api_routes());

    if !static_files.enabled {
        return router;
    }

    tracing::info!(
        dir = %static_files.dir.display(),
        path = %static_files.path,
        "Serving static files"
    );
    let serve_dir = ServeDir::new(&static_files.dir);
    let path = static_files.path.trim_end_matches('/');
    if path.is_empty() {
        router.fallback_service(serve_dir)
    } else {
        router.nest_service(path, serve_dir)
    }
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/story", post(handlers::generate_story))
        .route("/story/narration", post(handlers::narrate_story))
}
