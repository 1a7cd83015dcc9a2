//! Clarifai Adapter - 供应商工作流客户端

mod clarifai_client;
mod wire;

pub use clarifai_client::{ClarifaiClient, ClarifaiClientConfig};
