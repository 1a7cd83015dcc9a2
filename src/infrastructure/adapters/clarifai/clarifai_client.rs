//! Clarifai Client - 调用 Clarifai workflow 推理服务
//!
//! 实现 InferenceClientPort trait，通过 Clarifai 的 HTTP/JSON 网关调用预置工作流
//!
//! 外部 API:
//! POST {base_url}/v2/users/{user_id}/apps/{app_id}/workflows/{workflow_id}/results
//! Header: Authorization: Key {pat}
//! Request: {"inputs": [{"data": {"image": {"base64": "..."}}}]}  (JSON)
//! Response: {"status": {...}, "results": [{"outputs": [...]}]}

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::time::Duration;

use super::wire::{PostWorkflowResultsRequest, PostWorkflowResultsResponse};
use crate::application::ports::{
    InferenceClientPort, InferenceError, WorkflowInput, WorkflowKind, WorkflowOutputs,
};
use crate::config::{ClarifaiConfig, WorkflowIds};

/// Clarifai 客户端配置
#[derive(Debug, Clone)]
pub struct ClarifaiClientConfig {
    /// API 基础 URL
    pub base_url: String,
    pub user_id: String,
    pub app_id: String,
    /// Personal Access Token
    pub pat: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub workflows: WorkflowIds,
}

impl ClarifaiClientConfig {
    pub fn new(
        user_id: impl Into<String>,
        app_id: impl Into<String>,
        pat: impl Into<String>,
    ) -> Self {
        Self {
            base_url: "https://api.clarifai.com".to_string(),
            user_id: user_id.into(),
            app_id: app_id.into(),
            pat: pat.into(),
            timeout_secs: 120,
            workflows: WorkflowIds::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 从应用配置构建，token 缺失时返回 None
    pub fn from_app_config(config: &ClarifaiConfig) -> Option<Self> {
        let pat = config.pat.clone()?;
        Some(Self {
            base_url: config.base_url.clone(),
            user_id: config.user_id.clone(),
            app_id: config.app_id.clone(),
            pat,
            timeout_secs: config.timeout_secs,
            workflows: config.workflows.clone(),
        })
    }
}

/// Clarifai 客户端
pub struct ClarifaiClient {
    client: Client,
    config: ClarifaiClientConfig,
}

impl ClarifaiClient {
    pub fn new(config: ClarifaiClientConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取工作流结果 URL
    fn workflow_url(&self, kind: WorkflowKind) -> String {
        format!(
            "{}/v2/users/{}/apps/{}/workflows/{}/results",
            self.config.base_url.trim_end_matches('/'),
            self.config.user_id,
            self.config.app_id,
            self.config.workflows.id_for(kind)
        )
    }

    fn authorization(&self) -> String {
        format!("Key {}", self.config.pat)
    }
}

#[async_trait]
impl InferenceClientPort for ClarifaiClient {
    async fn invoke(
        &self,
        kind: WorkflowKind,
        input: WorkflowInput,
    ) -> Result<WorkflowOutputs, InferenceError> {
        let url = self.workflow_url(kind);
        let body = PostWorkflowResultsRequest::single(&input);

        tracing::debug!(
            url = %url,
            workflow = %kind,
            payload_len = input.len(),
            "Posting workflow results request"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::NetworkError(format!("Cannot connect to Clarifai: {}", e))
                } else {
                    InferenceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::InvalidResponse(format!("Failed to read body: {}", e)))?;

        // 失败时服务端通常仍返回带 status 的 JSON 包体，优先使用其中的描述
        let parsed: PostWorkflowResultsResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(InferenceError::RemoteService {
                    code: status.as_u16() as u32,
                    description: format!("HTTP {}: {}", status, text),
                });
            }
            Err(e) => {
                return Err(InferenceError::InvalidResponse(format!(
                    "Failed to parse response: {}",
                    e
                )));
            }
        };

        let outputs = parsed.into_outputs().map_err(|e| {
            tracing::error!(workflow = %kind, error = %e, "Workflow request failed");
            e
        })?;

        tracing::info!(
            workflow = %kind,
            outputs = outputs.len(),
            "Workflow request completed"
        );

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClarifaiClient {
        let config = ClarifaiClientConfig::new("user", "app", "secret")
            .with_base_url("http://localhost:9000/")
            .with_timeout(5);
        ClarifaiClient::new(config).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = ClarifaiClientConfig::new("u", "a", "p").with_timeout(60);
        assert_eq!(config.base_url, "https://api.clarifai.com");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.workflows.text_to_audio, "text-to-audio");
    }

    #[test]
    fn test_workflow_url() {
        let client = client();
        assert_eq!(
            client.workflow_url(WorkflowKind::ImageToTags),
            "http://localhost:9000/v2/users/user/apps/app/workflows/image-to-tags/results"
        );
    }

    #[test]
    fn test_authorization_header() {
        assert_eq!(client().authorization(), "Key secret");
    }

    #[test]
    fn test_from_app_config_requires_token() {
        let mut config = ClarifaiConfig::default();
        assert!(ClarifaiClientConfig::from_app_config(&config).is_none());

        config.pat = Some("token".to_string());
        config.user_id = "me".to_string();
        let client_config = ClarifaiClientConfig::from_app_config(&config).unwrap();
        assert_eq!(client_config.pat, "token");
        assert_eq!(client_config.user_id, "me");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let config = ClarifaiClientConfig::new("user", "app", "secret")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(2);
        let client = ClarifaiClient::new(config).unwrap();

        let result = client
            .invoke(WorkflowKind::TextToText, WorkflowInput::Text("hi".into()))
            .await;
        assert!(matches!(
            result,
            Err(InferenceError::NetworkError(_)) | Err(InferenceError::Timeout)
        ));
    }
}
