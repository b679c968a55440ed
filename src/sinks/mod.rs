//! logstore Sinks 模块
//!
//! 定义统一的 sink 接口以及 SQLite 实现。

pub mod sqlite;
pub mod traits;

// 重新导出主要类型
pub use sqlite::{SchemaVariant, SharedConnection, SqliteSink};
pub use traits::{RecordSink, SinkState};
