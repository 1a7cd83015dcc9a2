//! Memory Layer - In-Memory State Management
//!
//! 推理结果的内存缓存

mod inference_cache;

pub use inference_cache::{
    generate_cache_key, CachedInferenceClient, InferenceCacheConfig, InferenceCacheStats,
};
