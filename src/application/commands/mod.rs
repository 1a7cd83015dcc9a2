//! 应用层 - 命令
//!
//! 每个用户动作对应一个命令及其处理器

mod narration_commands;
mod story_commands;

pub mod handlers;

pub use narration_commands::*;
pub use story_commands::*;
