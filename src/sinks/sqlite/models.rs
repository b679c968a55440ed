//! logstore 数据库行模型
//!
//! 把 [`LogEvent`] 映射为待插入的一行。事件上缺失的属性写入 NULL，
//! 映射本身不会因为属性缺失而失败。

use crate::core::event::LogEvent;
use crate::error::Result;
use crate::sinks::sqlite::schema::SchemaVariant;
use rusqlite::ToSql;
use serde_json::{Map, Value};

/// Unix 纪元与 1601-01-01T00:00:00Z 之间的秒数
pub const FILETIME_EPOCH_OFFSET_SECS: f64 = 11_644_473_600.0;

/// 每秒的 100 纳秒间隔数
pub const FILETIME_TICKS_PER_SEC: f64 = 10_000_000.0;

/// 不进入 `details_json` 的属性，它们已有独立的列或只是原始模板
pub const DETAILS_EXCLUDED: &[&str] = &[
    "created", "levelno", "msg", "args", "name", "process", "message",
];

/// 将 Unix 浮点秒转换为 FILETIME 计数
///
/// 乘法之后向零截断，不做四舍五入。
pub fn unix_to_filetime(unix_seconds: f64) -> i64 {
    ((unix_seconds + FILETIME_EPOCH_OFFSET_SECS) * FILETIME_TICKS_PER_SEC) as i64
}

/// 收集所有未被核心列覆盖的属性
///
/// 不能原生编码为 JSON 的值会转为字符串形式，从不丢弃。
pub fn extract_details(event: &LogEvent) -> Map<String, Value> {
    event
        .attributes()
        .into_iter()
        .filter(|(key, _)| !DETAILS_EXCLUDED.contains(&key.as_str()))
        .map(|(key, value)| (key, value.to_json_lossy()))
        .collect()
}

/// `Full` / `FullFiletime` 共用的行结构，`T` 是时间戳的存储类型
#[derive(Debug, Clone, PartialEq)]
pub struct FullRow<T> {
    pub timestamp: T,
    pub name: String,
    pub levelno: i32,
    pub level: String,
    pub message: String,
    pub pathname: Option<String>,
    pub filename: Option<String>,
    pub module: Option<String>,
    pub lineno: Option<u32>,
    pub func_name: Option<String>,
    pub process: Option<u32>,
    pub process_name: Option<String>,
    pub thread: Option<i64>,
    pub thread_name: Option<String>,
}

impl<T> FullRow<T> {
    fn from_event(timestamp: T, event: &LogEvent, message: String) -> Self {
        Self {
            timestamp,
            name: event.name.clone(),
            levelno: event.level.levelno(),
            level: event.level.name().to_string(),
            message,
            pathname: event.pathname.clone(),
            filename: event.filename.clone(),
            module: event.module.clone(),
            lineno: event.lineno,
            func_name: event.func_name.clone(),
            process: event.process,
            process_name: event.process_name.clone(),
            thread: event.thread.and_then(|t| i64::try_from(t).ok()),
            thread_name: event.thread_name.clone(),
        }
    }
}

impl<T: ToSql> FullRow<T> {
    fn params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.timestamp as &dyn ToSql,
            &self.name,
            &self.levelno,
            &self.level,
            &self.message,
            &self.pathname,
            &self.filename,
            &self.module,
            &self.lineno,
            &self.func_name,
            &self.process,
            &self.process_name,
            &self.thread,
            &self.thread_name,
        ]
    }
}

/// 待插入的一行，变体与 [`SchemaVariant`] 一一对应
#[derive(Debug, Clone, PartialEq)]
pub enum LogRow {
    Minimal {
        timestamp: f64,
        level: String,
        message: String,
    },
    Full(FullRow<f64>),
    FullFiletime(FullRow<i64>),
    Details {
        timestamp: f64,
        severity: i32,
        message: String,
        source: String,
        process_id: Option<u32>,
        details_json: String,
    },
}

impl LogRow {
    /// 按表结构变体从事件生成一行，`message` 是已经格式化好的消息
    pub fn from_event(schema: SchemaVariant, event: &LogEvent, message: String) -> Result<Self> {
        let row = match schema {
            SchemaVariant::Minimal => Self::Minimal {
                timestamp: event.created,
                level: event.level.name().to_string(),
                message,
            },
            SchemaVariant::Full => Self::Full(FullRow::from_event(event.created, event, message)),
            SchemaVariant::FullFiletime => Self::FullFiletime(FullRow::from_event(
                unix_to_filetime(event.created),
                event,
                message,
            )),
            SchemaVariant::Details => Self::Details {
                timestamp: event.created,
                severity: event.level.levelno(),
                message,
                source: event.name.clone(),
                process_id: event.process,
                details_json: serde_json::to_string(&extract_details(event))?,
            },
        };
        Ok(row)
    }

    /// 绑定参数，顺序与 [`SchemaVariant::columns`] 一致
    pub fn params(&self) -> Vec<&dyn ToSql> {
        match self {
            Self::Minimal {
                timestamp,
                level,
                message,
            } => vec![timestamp as &dyn ToSql, level, message],
            Self::Full(row) => row.params(),
            Self::FullFiletime(row) => row.params(),
            Self::Details {
                timestamp,
                severity,
                message,
                source,
                process_id,
                details_json,
            } => vec![
                timestamp as &dyn ToSql,
                severity,
                message,
                source,
                process_id,
                details_json,
            ],
        }
    }
}
