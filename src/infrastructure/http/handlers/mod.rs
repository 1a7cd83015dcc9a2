//! HTTP Handlers

mod narration;
mod ping;
mod story;

pub use narration::*;
pub use ping::*;
pub use story::*;
