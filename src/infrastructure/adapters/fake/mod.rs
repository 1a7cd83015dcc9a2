//! Fake Adapter - 不访问网络的推理客户端

mod fake_inference_client;

pub use fake_inference_client::{FakeInferenceClient, FakeInferenceClientConfig, RecordedCall};
