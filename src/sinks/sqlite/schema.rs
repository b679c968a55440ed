//! logstore 数据库表结构定义
//!
//! 四种表结构只在持久化的列上不同。表名是唯一拼接进 SQL 文本的标识符，
//! 由调用方提供并被视为可信；所有数据值都通过绑定参数传入。

use serde::Deserialize;

/// 默认表名
pub const DEFAULT_TABLE_NAME: &str = "logs";

/// 表结构变体
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// 只保存时间、级别名和消息
    Minimal,
    /// 保存全部常用属性
    Full,
    /// 与 `Full` 相同，但时间戳编码为 FILETIME 整数
    FullFiletime,
    /// 核心列加上一个 JSON 列，保存其余全部属性
    #[default]
    Details,
}

const MINIMAL_COLUMNS: &[&str] = &["timestamp", "level", "message"];

const FULL_COLUMNS: &[&str] = &[
    "timestamp",
    "name",
    "levelno",
    "level",
    "message",
    "pathname",
    "filename",
    "module",
    "lineno",
    "func_name",
    "process",
    "process_name",
    "thread",
    "thread_name",
];

const DETAILS_COLUMNS: &[&str] = &[
    "timestamp",
    "severity",
    "message",
    "source",
    "process_id",
    "details_json",
];

/// `Full` 与 `FullFiletime` 共用的时间戳之后的列定义
const FULL_TAIL_DDL: &str = "
    name TEXT,
    levelno INTEGER,
    level TEXT,
    message TEXT,
    pathname TEXT,
    filename TEXT,
    module TEXT,
    lineno INTEGER,
    func_name TEXT,
    process INTEGER,
    process_name TEXT,
    thread INTEGER,
    thread_name TEXT";

impl SchemaVariant {
    pub fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Full => "full",
            Self::FullFiletime => "full_filetime",
            Self::Details => "details",
        }
    }

    /// 插入语句使用的列，顺序与绑定参数一致
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Minimal => MINIMAL_COLUMNS,
            Self::Full | Self::FullFiletime => FULL_COLUMNS,
            Self::Details => DETAILS_COLUMNS,
        }
    }

    /// 幂等的建表语句
    pub fn create_table_sql(self, table: &str) -> String {
        match self {
            Self::Minimal => format!(
                "CREATE TABLE IF NOT EXISTS {} (
    timestamp REAL NOT NULL,
    level TEXT NOT NULL,
    message TEXT NOT NULL
)",
                table
            ),
            Self::Full => format!(
                "CREATE TABLE IF NOT EXISTS {} (
    timestamp REAL NOT NULL,{}
)",
                table, FULL_TAIL_DDL
            ),
            Self::FullFiletime => format!(
                "CREATE TABLE IF NOT EXISTS {} (
    timestamp INTEGER NOT NULL,{}
)",
                table, FULL_TAIL_DDL
            ),
            Self::Details => format!(
                "CREATE TABLE IF NOT EXISTS {} (
    timestamp REAL NOT NULL,
    severity INTEGER NOT NULL,
    message TEXT NOT NULL,
    source TEXT NOT NULL,
    process_id INTEGER,
    details_json TEXT
)",
                table
            ),
        }
    }

    /// 参数化的插入语句
    pub fn insert_sql(self, table: &str) -> String {
        let columns = self.columns();
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        )
    }
}
