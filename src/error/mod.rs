//! 统一错误处理模块
//!
//! 按领域拆分的结构化错误类型。

mod app;
mod load;
mod preload;

pub use app::{AppError, SettingsError};
pub use load::{LoadError, LoadFailure};
pub use preload::PreloadError;
