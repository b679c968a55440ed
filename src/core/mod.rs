//! logstore 核心模块
//!
//! 本模块包含事件模型、消息格式化和 tracing 接入层。

pub mod event;
pub mod formatter;
pub mod layer;

// 重新导出核心类型
pub use event::{FieldValue, LogEvent, LogLevel};
pub use formatter::MessageFormatter;
pub use layer::SinkLayer;
