//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod clarifai;
pub mod fake;
pub mod transcoder;

pub use clarifai::*;
pub use fake::*;
pub use transcoder::*;
