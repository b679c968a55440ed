//! logstore - 把 tracing 日志记录持久化到 SQLite 表
//!
//! logstore 提供一个同步的 tracing 层：每个事件被格式化、映射为一行，
//! 通过参数化语句插入调用方打开的 SQLite 连接并立即提交。
//! 表结构有四种变体，默认的 `details` 变体把核心列之外的全部属性保存为 JSON。
//!
//! # 快速开始
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use logstore::rusqlite::Connection;
//! use logstore::{SinkLayer, SqliteSink};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! fn main() -> logstore::Result<()> {
//!     let conn = Arc::new(Mutex::new(Connection::open_in_memory()?));
//!
//!     let sink = Arc::new(SqliteSink::with_table(Arc::clone(&conn), "logs")?);
//!     let subscriber = tracing_subscriber::registry().with(SinkLayer::from_shared(Arc::clone(&sink)));
//!
//!     tracing::subscriber::with_default(subscriber, || {
//!         tracing::info!(user = "alice", "login ok");
//!     });
//!     sink.close()?;
//!
//!     let count: i64 = conn
//!         .lock()
//!         .unwrap()
//!         .query_row("SELECT COUNT(*) FROM logs", [], |r| r.get(0))?;
//!     assert_eq!(count, 1);
//!     Ok(())
//! }
//! ```
//!
//! # 全局安装
//!
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use logstore::rusqlite::Connection;
//! use logstore::{SchemaVariant, SqliteSinkConfig};
//!
//! fn main() -> logstore::Result<()> {
//!     let conn = Arc::new(Mutex::new(Connection::open("app.db")?));
//!     let config = SqliteSinkConfig {
//!         schema: SchemaVariant::Full,
//!         level: Some("INFO".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let handle = logstore::init(conn, config)?;
//!     tracing::info!("service started");
//!     handle.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod sinks;
pub mod utils;

pub use rusqlite;

// 重新导出主要类型
pub use config::{load_config_from_file, load_config_from_str, validate_config, SqliteSinkConfig};
pub use diagnostics::DiagnosticsSnapshot;
pub use error::{LogStoreError, Result};

// 重新导出核心功能
pub use core::event::{FieldValue, LogEvent, LogLevel};
pub use core::formatter::MessageFormatter;
pub use core::layer::SinkLayer;
pub use sinks::sqlite::{SchemaVariant, SharedConnection, SqliteSink};
pub use sinks::traits::{RecordSink, SinkState};

use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 创建写入 SQLite 的 tracing 层
///
/// 建表在这里完成，返回的层可以与其他层自由组合。
/// 通过 [`SinkLayer::sink`] 拿到 sink 后调用 `close` 即可停止写入。
///
/// # 参数
///
/// * `conn` - 调用方打开的共享连接
/// * `config` - sink 配置
pub fn layer(conn: SharedConnection, config: &SqliteSinkConfig) -> Result<SinkLayer<SqliteSink>> {
    let sink = SqliteSink::new(conn, config)?;
    Ok(SinkLayer::new(sink))
}

/// 安装全局订阅器
///
/// 订阅器由 registry 加上按 `config.level` 过滤的 SQLite 层组成。
/// 未配置级别时使用 `RUST_LOG`，环境变量也不存在时记录全部级别。
/// 每个进程只能成功调用一次。
pub fn init(conn: SharedConnection, config: SqliteSinkConfig) -> Result<SinkHandle> {
    let filter = level_filter(
        config.min_level()?,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );

    let sink_layer = layer(conn, &config)?;
    let sink = Arc::clone(sink_layer.sink());

    tracing_subscriber::registry()
        .with(sink_layer.with_filter(filter))
        .try_init()
        .map_err(|e| LogStoreError::initialization(format!("安装全局订阅器失败: {}", e)))?;

    Ok(SinkHandle { sink })
}

/// 选择全局安装使用的过滤器：配置级别优先，其次是环境变量中的指令
fn level_filter(level: Option<LogLevel>, env_directives: Option<String>) -> EnvFilter {
    match (level, env_directives) {
        (Some(level), _) => EnvFilter::new(level.to_level_filter().to_string()),
        (None, Some(directives)) if !directives.trim().is_empty() => EnvFilter::new(directives),
        (None, _) => EnvFilter::new("trace"),
    }
}

/// 全局安装后的关闭句柄
///
/// 关闭后层仍留在订阅器中，但不再写入任何事件。
#[derive(Debug, Clone)]
pub struct SinkHandle {
    sink: Arc<SqliteSink>,
}

impl SinkHandle {
    /// 提交并关闭 sink，可以重复调用
    pub fn shutdown(&self) -> Result<()> {
        self.sink.close()
    }

    pub fn sink(&self) -> &Arc<SqliteSink> {
        &self.sink
    }
}
