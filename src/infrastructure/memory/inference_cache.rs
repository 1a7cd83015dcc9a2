//! Cached Inference Client - 推理结果的内存缓存
//!
//! 包装任意 [`InferenceClientPort`]，相同工作流 + 相同输入直接返回上次成功的结果。
//! - 缓存 key: md5(workflow + payload)
//! - 只缓存成功结果
//! - 超过 TTL 的条目视为不存在
//! - 条目数超过上限时淘汰最久未访问的条目（LRU）

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    InferenceClientPort, InferenceError, WorkflowInput, WorkflowKind, WorkflowOutputs,
};
use crate::config::CacheConfig;

/// 缓存配置
#[derive(Debug, Clone)]
pub struct InferenceCacheConfig {
    pub max_entries: usize,
    /// 条目存活时间（秒），0 表示立即过期
    pub ttl_secs: u64,
}

impl Default for InferenceCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl_secs: 3600,
        }
    }
}

impl From<&CacheConfig> for InferenceCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            ttl_secs: config.ttl_secs,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceCacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outputs: WorkflowOutputs,
    /// 写入时间（毫秒时间戳）
    created_at: i64,
    /// 访问序号，越大越新
    last_accessed: u64,
}

/// 生成缓存 key
pub fn generate_cache_key(kind: WorkflowKind, input: &WorkflowInput) -> String {
    let mut context = md5::Context::new();
    context.consume(kind.as_str().as_bytes());
    context.consume([0u8]);
    context.consume(input.as_bytes());
    format!("{:x}", context.compute())
}

/// 带缓存的推理客户端
pub struct CachedInferenceClient {
    inner: Arc<dyn InferenceClientPort>,
    config: InferenceCacheConfig,
    entries: DashMap<String, CacheEntry>,
    access_clock: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl CachedInferenceClient {
    pub fn new(inner: Arc<dyn InferenceClientPort>, config: InferenceCacheConfig) -> Self {
        tracing::info!(
            max_entries = config.max_entries,
            ttl_secs = config.ttl_secs,
            "Inference cache initialized"
        );
        Self {
            inner,
            config,
            entries: DashMap::new(),
            access_clock: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> InferenceCacheStats {
        InferenceCacheStats {
            total_entries: self.entries.len(),
            max_entries: self.config.max_entries,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn tick(&self) -> u64 {
        self.access_clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn is_expired(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        let ttl_ms = (self.config.ttl_secs as i64).saturating_mul(1000);
        now_ms - entry.created_at >= ttl_ms
    }

    fn get(&self, key: &str) -> Option<WorkflowOutputs> {
        let now_ms = Utc::now().timestamp_millis();

        let expired = match self.entries.get_mut(key) {
            Some(mut entry) => {
                if self.is_expired(&entry, now_ms) {
                    true
                } else {
                    // LRU touch
                    entry.last_accessed = self.tick();
                    return Some(entry.outputs.clone());
                }
            }
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            tracing::debug!(key = %key, "Cache entry expired");
        }
        None
    }

    fn put(&self, key: String, outputs: WorkflowOutputs) {
        let entry = CacheEntry {
            outputs,
            created_at: Utc::now().timestamp_millis(),
            last_accessed: self.tick(),
        };
        self.entries.insert(key, entry);

        while self.entries.len() > self.config.max_entries {
            if !self.evict_lru() {
                break;
            }
        }
    }

    /// LRU 淘汰
    fn evict_lru(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_accessed)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => {
                self.entries.remove(&key);
                tracing::debug!(key = %key, "LRU evicted cache entry");
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl InferenceClientPort for CachedInferenceClient {
    async fn invoke(
        &self,
        kind: WorkflowKind,
        input: WorkflowInput,
    ) -> Result<WorkflowOutputs, InferenceError> {
        let key = generate_cache_key(kind, &input);

        if let Some(outputs) = self.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(workflow = %kind, key = %key, "Inference cache hit");
            return Ok(outputs);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let outputs = self.inner.invoke(kind, input).await?;
        self.put(key, outputs.clone());

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeInferenceClient;

    fn cached(
        inner: Arc<FakeInferenceClient>,
        max_entries: usize,
        ttl_secs: u64,
    ) -> CachedInferenceClient {
        CachedInferenceClient::new(
            inner,
            InferenceCacheConfig {
                max_entries,
                ttl_secs,
            },
        )
    }

    #[test]
    fn test_cache_key_depends_on_workflow_and_payload() {
        let text = WorkflowInput::Text("hello".to_string());
        let bytes = WorkflowInput::Image(b"hello".to_vec());

        assert_eq!(
            generate_cache_key(WorkflowKind::TextToText, &text),
            generate_cache_key(WorkflowKind::TextToText, &text)
        );
        assert_ne!(
            generate_cache_key(WorkflowKind::TextToText, &text),
            generate_cache_key(WorkflowKind::TextToAudio, &text)
        );
        assert_ne!(
            generate_cache_key(WorkflowKind::TextToText, &text),
            generate_cache_key(WorkflowKind::TextToText, &WorkflowInput::Text("hi".into()))
        );
        // 同样的字节，同样的 key
        assert_eq!(
            generate_cache_key(WorkflowKind::ImageToText, &bytes),
            generate_cache_key(WorkflowKind::ImageToText, &WorkflowInput::Image(b"hello".to_vec()))
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_inner_client() {
        let inner = Arc::new(FakeInferenceClient::with_defaults());
        let client = cached(inner.clone(), 16, 3600);

        let first = client.describe_image(&[1, 2, 3]).await.unwrap();
        let second = client.describe_image(&[1, 2, 3]).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.call_count(WorkflowKind::ImageToText), 1);

        let stats = client.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(FakeInferenceClient::with_defaults().failing_audio_times(1));
        let client = cached(inner.clone(), 16, 3600);

        assert!(client.synthesize_speech("Hello").await.is_err());
        assert!(client.synthesize_speech("Hello").await.is_ok());
        assert!(client.synthesize_speech("Hello").await.is_ok());

        assert_eq!(inner.call_count(WorkflowKind::TextToAudio), 2);
        assert_eq!(client.stats().total_entries, 1);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let inner = Arc::new(FakeInferenceClient::with_defaults());
        let client = cached(inner.clone(), 2, 3600);

        client.generate_text("a").await.unwrap();
        client.generate_text("b").await.unwrap();
        // 访问 a，使 b 成为最久未访问
        client.generate_text("a").await.unwrap();
        client.generate_text("c").await.unwrap();

        assert_eq!(client.stats().total_entries, 2);

        client.generate_text("a").await.unwrap();
        client.generate_text("b").await.unwrap();

        // a 命中；b 已被淘汰，需要再次调用
        let calls: Vec<String> = inner.calls().into_iter().map(|c| c.payload).collect();
        assert_eq!(calls, vec!["a", "b", "c", "b"]);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let inner = Arc::new(FakeInferenceClient::with_defaults());
        let client = cached(inner.clone(), 16, 0);

        client.generate_text("a").await.unwrap();
        client.generate_text("a").await.unwrap();

        assert_eq!(inner.call_count(WorkflowKind::TextToText), 2);
        assert_eq!(client.stats().hit_count, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let inner = Arc::new(FakeInferenceClient::with_defaults());
        let client = cached(inner, 16, 3600);

        client.generate_text("a").await.unwrap();
        client.clear();

        assert_eq!(client.stats().total_entries, 0);
    }
}
