//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 供应商约定的 token 环境变量
pub const CLARIFAI_PAT_ENV: &str = "CLARIFAI_PERSONAL_ACCESS_TOKEN";

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `STORYTELLER_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// `clarifai.pat` 未配置时回退到 `CLARIFAI_PERSONAL_ACCESS_TOKEN`。
///
/// # 环境变量示例
/// - `STORYTELLER_SERVER__PORT=8080`
/// - `STORYTELLER_CLARIFAI__USER_ID=me`
/// - `STORYTELLER_CLARIFAI__APP_ID=stories`
/// - `STORYTELLER_NARRATION__OUTPUT_FORMAT=opus`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8501)?
        .set_default("clarifai.base_url", "https://api.clarifai.com")?
        .set_default("clarifai.timeout_secs", 120)?
        .set_default("narration.max_attempts", 3)?
        .set_default("narration.output_format", "wav")?
        .set_default("cache.enabled", true)?
        .set_default("cache.max_entries", 256)?
        .set_default("cache.ttl_secs", 3600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: STORYTELLER_CLARIFAI__APP_ID=stories
    builder = builder.add_source(
        Environment::with_prefix("STORYTELLER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    apply_token_fallback(&mut app_config, std::env::var(CLARIFAI_PAT_ENV).ok());

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 配置中没有 token 时使用环境变量中的值
fn apply_token_fallback(config: &mut AppConfig, env_token: Option<String>) {
    let missing = config
        .clarifai
        .pat
        .as_deref()
        .map_or(true, |pat| pat.trim().is_empty());
    if missing {
        config.clarifai.pat = env_token.filter(|t| !t.trim().is_empty());
    }
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.clarifai.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Clarifai base URL cannot be empty".to_string(),
        ));
    }

    if config.clarifai.user_id.is_empty() || config.clarifai.app_id.is_empty() {
        return Err(ConfigError::ValidationError(
            "Clarifai user_id and app_id must be set".to_string(),
        ));
    }

    match config.clarifai.pat.as_deref() {
        Some(pat) if !pat.trim().is_empty() => {}
        _ => {
            return Err(ConfigError::MissingCredentials(format!(
                "set clarifai.pat or {}",
                CLARIFAI_PAT_ENV
            )));
        }
    }

    if config.narration.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Narration max_attempts must be at least 1".to_string(),
        ));
    }

    if config.cache.enabled && config.cache.max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "Cache max_entries cannot be 0 when cache is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 遮蔽 token，仅保留末尾 4 位
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Clarifai URL: {}", config.clarifai.base_url);
    tracing::info!(
        "Clarifai App: {}/{}",
        config.clarifai.user_id,
        config.clarifai.app_id
    );
    tracing::info!(
        "Clarifai Token: {}",
        config.clarifai.pat.as_deref().map(mask_token).unwrap_or_default()
    );
    tracing::info!("Clarifai Timeout: {}s", config.clarifai.timeout_secs);
    tracing::info!("Narration Attempts: {}", config.narration.max_attempts);
    tracing::info!("Narration Format: {}", config.narration.output_format);
    tracing::info!("Cache Enabled: {}", config.cache.enabled);
    if config.cache.enabled {
        tracing::info!("Cache Max Entries: {}", config.cache.max_entries);
        tracing::info!("Cache TTL: {}s", config.cache.ttl_secs);
    }
    tracing::info!("Static Files: {}", config.server.static_files.enabled);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::AudioFormat;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.clarifai.user_id = "user".to_string();
        config.clarifai.app_id = "app".to_string();
        config.clarifai.pat = Some("secret-token".to_string());
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_token_is_credentials_error() {
        let mut config = valid_config();
        config.clarifai.pat = None;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingCredentials(_))
        ));

        config.clarifai.pat = Some("  ".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_validation_error_for_missing_app() {
        let mut config = valid_config();
        config.clarifai.app_id = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = valid_config();
        config.narration.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_token_fallback_only_when_missing() {
        let mut config = valid_config();
        apply_token_fallback(&mut config, Some("from-env".to_string()));
        assert_eq!(config.clarifai.pat.as_deref(), Some("secret-token"));

        config.clarifai.pat = None;
        apply_token_fallback(&mut config, Some("from-env".to_string()));
        assert_eq!(config.clarifai.pat.as_deref(), Some("from-env"));

        config.clarifai.pat = None;
        apply_token_fallback(&mut config, Some(String::new()));
        assert!(config.clarifai.pat.is_none());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefgh1234"), "****1234");
        assert_eq!(mask_token("abc"), "****");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[clarifai]
user_id = "file-user"
app_id = "file-app"
pat = "file-token"

[clarifai.workflows]
text_to_audio = "custom-tts"

[narration]
output_format = "opus"
max_attempts = 5
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.clarifai.user_id, "file-user");
        assert_eq!(config.clarifai.pat.as_deref(), Some("file-token"));
        assert_eq!(config.clarifai.workflows.text_to_audio, "custom-tts");
        assert_eq!(config.clarifai.workflows.image_to_text, "image-to-text");
        assert_eq!(config.narration.output_format, AudioFormat::Opus);
        assert_eq!(config.narration.max_attempts, 5);
        assert_eq!(config.cache.max_entries, 256);
    }
}
