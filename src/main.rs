//! Storyteller - 图片故事生成服务

use std::sync::Arc;

use storyteller::application::{
    GenerateStoryHandler, InferenceClientPort, NarrateStoryHandler, SegmentSynthesizer,
};
use storyteller::config::{load_config, print_config, LogConfig};
use storyteller::infrastructure::adapters::{ClarifaiClient, ClarifaiClientConfig, WavMerger};
use storyteller::infrastructure::http::{AppState, HttpServer};
use storyteller::infrastructure::memory::{CachedInferenceClient, InferenceCacheConfig};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},storyteller={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Storyteller - 图片故事生成服务");
    print_config(&config);

    // 创建 Clarifai 客户端
    let client_config = ClarifaiClientConfig::from_app_config(&config.clarifai)
        .ok_or_else(|| anyhow::anyhow!("Clarifai personal access token is not configured"))?;
    let clarifai = Arc::new(ClarifaiClient::new(client_config)?);

    // 推理结果缓存
    let inference: Arc<dyn InferenceClientPort> = if config.cache.enabled {
        Arc::new(CachedInferenceClient::new(
            clarifai,
            InferenceCacheConfig::from(&config.cache),
        ))
    } else {
        clarifai
    };

    // 创建命令处理器
    let story_handler = GenerateStoryHandler::new(inference.clone());
    let narration_handler = NarrateStoryHandler::new(
        SegmentSynthesizer::new(inference, config.narration.max_attempts),
        Arc::new(WavMerger::new()),
        config.narration.merge_config(),
    );

    let state = AppState::new(story_handler, narration_handler);
    let server = HttpServer::new(config.server.clone(), state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
