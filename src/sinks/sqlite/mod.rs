//! SQLite 日志存储
//!
//! 提供表结构定义、行模型和同步写入的 sink。

pub mod models;
pub mod schema;
pub mod sink;

pub use models::{unix_to_filetime, LogRow};
pub use schema::{SchemaVariant, DEFAULT_TABLE_NAME};
pub use sink::{commit, SharedConnection, SqliteSink};
