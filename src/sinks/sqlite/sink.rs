//! SQLite Sink 实现
//!
//! 每个事件都是一次同步往返：格式化、生成行、参数化插入、立即提交。
//! 没有缓冲、批量或重试。连接由调用方打开和拥有，sink 从不关闭它。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::debug;

use crate::config::{validate_config, SqliteSinkConfig};
use crate::core::event::LogEvent;
use crate::core::formatter::MessageFormatter;
use crate::diagnostics::{Diagnostics, DiagnosticsSnapshot};
use crate::error::{LogStoreError, Result};
use crate::sinks::sqlite::models::LogRow;
use crate::sinks::sqlite::schema::SchemaVariant;
use crate::sinks::traits::{RecordSink, SinkState};

/// 调用方持有的共享连接
///
/// 互斥锁即调用方的并发约束，sink 每次写入只在插入加提交期间持锁。
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 提交连接上未完成的事务
///
/// 自动提交模式下没有待提交的内容，直接返回。
pub fn commit(conn: &Connection) -> Result<()> {
    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT")?;
    }
    Ok(())
}

/// SQLite Sink 结构体
///
/// 负责把日志事件逐条写入 SQLite 表。
pub struct SqliteSink {
    /// 调用方的连接
    conn: SharedConnection,
    /// 目标表名
    table: String,
    /// 表结构变体
    schema: SchemaVariant,
    /// 预先生成的插入语句
    insert_sql: String,
    /// 消息格式化器
    formatter: MessageFormatter,
    /// 是否已关闭
    closed: AtomicBool,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for SqliteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSink")
            .field("table", &self.table)
            .field("schema", &self.schema)
            .field("formatter", &self.formatter)
            .field("state", &self.state())
            .field("conn", &"<Connection>")
            .finish()
    }
}

impl SqliteSink {
    /// 创建新的 SQLite Sink 实例
    ///
    /// 会执行一次幂等的建表语句并提交。表已存在时不会失败，
    /// 也不会校验已有表的列是否匹配。
    ///
    /// # 参数
    /// * `conn` - 已打开的共享连接
    /// * `config` - sink 配置
    pub fn new(conn: SharedConnection, config: &SqliteSinkConfig) -> Result<Self> {
        validate_config(config)?;

        let formatter = MessageFormatter::new(config.format.clone())
            .with_timestamp_format(config.timestamp_format.clone());

        let sink = Self {
            conn,
            table: config.table_name.clone(),
            schema: config.schema,
            insert_sql: config.schema.insert_sql(&config.table_name),
            formatter,
            closed: AtomicBool::new(false),
            diagnostics: Diagnostics::new(),
        };

        sink.ensure_table()?;
        debug!(
            table = %sink.table,
            schema = sink.schema.name(),
            "log table ready"
        );
        Ok(sink)
    }

    /// 使用默认配置和指定表名创建
    pub fn with_table(conn: SharedConnection, table: impl Into<String>) -> Result<Self> {
        let config = SqliteSinkConfig {
            table_name: table.into(),
            ..Default::default()
        };
        Self::new(conn, &config)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> SchemaVariant {
        self.schema
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.conn
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// 写入一个事件并立即提交
    pub fn emit(&self, event: &LogEvent) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LogStoreError::SinkClosed);
        }

        let result = self.write_row(event);
        match result {
            Ok(()) => self.diagnostics.increment_rows_written(),
            Err(_) => self.diagnostics.increment_sink_errors(),
        }
        result
    }

    /// 关闭 sink
    ///
    /// 尝试最后一次提交；无论成功与否都进入 `Closed` 状态。重复调用直接返回。
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let result = {
            let conn = self.lock();
            commit(&conn)
        };
        debug!(table = %self.table, ok = result.is_ok(), "log sink closed");
        result
    }

    fn ensure_table(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(&self.schema.create_table_sql(&self.table))?;
        commit(&conn)
    }

    fn write_row(&self, event: &LogEvent) -> Result<()> {
        let message = self.formatter.format(event);
        let row = LogRow::from_event(self.schema, event, message)?;

        let conn = self.lock();
        conn.execute(&self.insert_sql, row.params().as_slice())?;
        commit(&conn)
    }

    /// 锁中毒时连接本身仍然可用
    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RecordSink for SqliteSink {
    fn send_event(&self, event: &LogEvent) -> Result<()> {
        self.emit(event)
    }

    fn shutdown(&self) -> Result<()> {
        self.close()
    }

    fn state(&self) -> SinkState {
        if self.closed.load(Ordering::SeqCst) {
            SinkState::Closed
        } else {
            SinkState::Open
        }
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn stats(&self) -> String {
        let snapshot = self.diagnostics.snapshot();
        format!(
            "SqliteSink[{}]: {} rows, {} errors, {:?}",
            self.table,
            snapshot.rows_written,
            snapshot.sink_errors,
            self.state()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{FieldValue, LogLevel};
    use crate::sinks::sqlite::models::unix_to_filetime;

    fn shared_memory_db() -> SharedConnection {
        Arc::new(Mutex::new(Connection::open_in_memory().unwrap()))
    }

    fn sink_with(conn: &SharedConnection, schema: SchemaVariant) -> SqliteSink {
        let config = SqliteSinkConfig {
            schema,
            ..Default::default()
        };
        SqliteSink::new(Arc::clone(conn), &config).unwrap()
    }

    fn count_rows(conn: &SharedConnection, table: &str) -> i64 {
        conn.lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_minimal_schema_row() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);

        sink.emit(&LogEvent::new("app", LogLevel::Info, "hello world"))
            .unwrap();

        let (level, message): (String, String) = conn
            .lock()
            .unwrap()
            .query_row("SELECT level, message FROM logs", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(level, "INFO");
        assert_eq!(message, "hello world");
    }

    #[test]
    fn test_full_schema_mirrors_event() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Full);
        let event = LogEvent::new("app.db", LogLevel::Warning, "slow query {}ms")
            .with_args(vec![FieldValue::from(250_i64)])
            .with_location("src/db.rs", Some(31));

        sink.emit(&event).unwrap();

        let guard = conn.lock().unwrap();
        let (timestamp, name, levelno, level, message): (f64, String, i32, String, String) = guard
            .query_row(
                "SELECT timestamp, name, levelno, level, message FROM logs",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .unwrap();
        assert_eq!(timestamp, event.created);
        assert_eq!(name, "app.db");
        assert_eq!(levelno, 30);
        assert_eq!(level, "WARNING");
        assert_eq!(message, "slow query 250ms");

        let (filename, module, func_name, process): (
            Option<String>,
            Option<String>,
            Option<String>,
            i64,
        ) = guard
            .query_row(
                "SELECT filename, module, func_name, process FROM logs",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(filename.as_deref(), Some("db.rs"));
        assert!(module.is_none());
        assert!(func_name.is_none());
        assert_eq!(process, i64::from(std::process::id()));
    }

    #[test]
    fn test_filetime_schema_stores_ticks() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::FullFiletime);
        let event = LogEvent::new("app", LogLevel::Info, "tick").with_created(1700000000.0);

        sink.emit(&event).unwrap();

        let ticks: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT timestamp FROM logs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(ticks, unix_to_filetime(1700000000.0));
        assert_eq!(ticks, 133_444_736_000_000_000);
    }

    #[test]
    fn test_details_schema_row() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Details);
        let event = LogEvent::new("testlogger", LogLevel::Info, "hello world")
            .with_location("src/main.rs", Some(3))
            .with_field("socket", FieldValue::Debug("TcpStream { fd: 3 }".into()));

        sink.emit(&event).unwrap();

        let (source, severity, message, process_id, details_json): (
            String,
            i32,
            String,
            i64,
            String,
        ) = conn
            .lock()
            .unwrap()
            .query_row(
                "SELECT source, severity, message, process_id, details_json FROM logs",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .unwrap();

        assert_eq!(source, "testlogger");
        assert_eq!(severity, 20);
        assert_eq!(message, "hello world");
        assert_eq!(process_id, i64::from(std::process::id()));

        let details: serde_json::Value = serde_json::from_str(&details_json).unwrap();
        assert_eq!(details["pathname"], "src/main.rs");
        assert_eq!(details["socket"], "TcpStream { fd: 3 }");
        assert!(details.get("msg").is_none());
        assert!(details.get("process").is_none());
    }

    #[test]
    fn test_custom_table_and_format() {
        let conn = shared_memory_db();
        let config = SqliteSinkConfig {
            table_name: "audit".to_string(),
            schema: SchemaVariant::Minimal,
            format: "{levelname}:{name}:{message}".to_string(),
            ..Default::default()
        };
        let sink = SqliteSink::new(Arc::clone(&conn), &config).unwrap();

        sink.emit(&LogEvent::new("auth", LogLevel::Error, "denied"))
            .unwrap();

        let message: String = conn
            .lock()
            .unwrap()
            .query_row("SELECT message FROM audit", [], |r| r.get(0))
            .unwrap();
        assert_eq!(message, "ERROR:auth:denied");
        assert_eq!(sink.table(), "audit");
    }

    #[test]
    fn test_second_sink_keeps_existing_rows() {
        let conn = shared_memory_db();
        let first = SqliteSink::with_table(Arc::clone(&conn), "logs").unwrap();
        first
            .emit(&LogEvent::new("app", LogLevel::Info, "one"))
            .unwrap();

        let second = SqliteSink::with_table(Arc::clone(&conn), "logs").unwrap();
        assert_eq!(count_rows(&conn, "logs"), 1);

        second
            .emit(&LogEvent::new("app", LogLevel::Info, "two"))
            .unwrap();
        assert_eq!(count_rows(&conn, "logs"), 2);
    }

    #[test]
    fn test_emit_commits_pending_transaction() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);

        conn.lock().unwrap().execute_batch("BEGIN").unwrap();
        assert!(!conn.lock().unwrap().is_autocommit());

        sink.emit(&LogEvent::new("app", LogLevel::Info, "inside"))
            .unwrap();
        assert!(conn.lock().unwrap().is_autocommit());
    }

    #[test]
    fn test_close_state_machine() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);
        assert_eq!(sink.state(), SinkState::Open);

        sink.close().unwrap();
        assert_eq!(sink.state(), SinkState::Closed);
        assert!(sink.close().is_ok());

        let result = sink.emit(&LogEvent::new("app", LogLevel::Info, "late"));
        assert!(matches!(result, Err(LogStoreError::SinkClosed)));
        assert_eq!(count_rows(&conn, "logs"), 0);
    }

    #[test]
    fn test_close_commits_and_leaves_connection_open() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);

        conn.lock().unwrap().execute_batch("BEGIN").unwrap();
        sink.close().unwrap();

        let guard = conn.lock().unwrap();
        assert!(guard.is_autocommit());
        guard.execute_batch("SELECT 1").unwrap();
    }

    #[test]
    fn test_failed_final_commit_still_closes() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);

        conn.lock()
            .unwrap()
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                 CREATE TABLE parent (id INTEGER PRIMARY KEY);
                 CREATE TABLE child (
                     parent_id INTEGER REFERENCES parent (id) DEFERRABLE INITIALLY DEFERRED
                 );
                 BEGIN;
                 INSERT INTO child (parent_id) VALUES (1);",
            )
            .unwrap();

        let result = sink.close();
        assert!(matches!(result, Err(LogStoreError::DatabaseError { .. })));
        assert_eq!(sink.state(), SinkState::Closed);
        assert!(sink.close().is_ok());
        assert!(matches!(
            sink.emit(&LogEvent::new("app", LogLevel::Info, "late")),
            Err(LogStoreError::SinkClosed)
        ));
    }

    #[test]
    fn test_insert_failure_propagates() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);
        conn.lock().unwrap().execute_batch("DROP TABLE logs").unwrap();

        let result = sink.emit(&LogEvent::new("app", LogLevel::Info, "lost"));
        assert!(matches!(result, Err(LogStoreError::DatabaseError { .. })));
        assert_eq!(sink.diagnostics().sink_errors, 1);
        assert_eq!(sink.diagnostics().rows_written, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let conn = shared_memory_db();
        let result = SqliteSink::with_table(conn, "  ");
        assert!(matches!(result, Err(LogStoreError::ConfigError(_))));
    }

    #[test]
    fn test_stats() {
        let conn = shared_memory_db();
        let sink = sink_with(&conn, SchemaVariant::Minimal);
        sink.emit(&LogEvent::new("app", LogLevel::Info, "x")).unwrap();

        assert_eq!(sink.stats(), "SqliteSink[logs]: 1 rows, 0 errors, Open");
        assert_eq!(sink.name(), "sqlite");
    }
}
