//! logstore 事件定义
//!
//! 此模块定义了写入 sink 之前的日志事件结构：时间、级别、消息、
//! 调用点位置、进程/线程信息，以及调用方附加的任意字段。

use crate::utils::background_info::BackgroundInfo;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 首次使用本库的时间（Unix 秒），`relative_created` 以此为基准
static START_TIME: Lazy<f64> = Lazy::new(now_unix_seconds);

/// 当前时间，Unix 纪元以来的浮点秒数
pub fn now_unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// 事件的全部内置属性名，顺序即 [`LogEvent::attributes`] 的输出顺序
pub const CORE_ATTRIBUTES: &[&str] = &[
    "name",
    "msg",
    "args",
    "levelname",
    "levelno",
    "pathname",
    "filename",
    "module",
    "lineno",
    "func_name",
    "created",
    "msecs",
    "relative_created",
    "thread",
    "thread_name",
    "process",
    "process_name",
];

/// 日志级别
///
/// 数值与常见日志框架保持一致，数值越大越严重。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace = 5,
    Debug = 10,
    Info = 20,
    #[serde(alias = "WARN")]
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl LogLevel {
    /// 数值级别
    pub const fn levelno(self) -> i32 {
        self as i32
    }

    /// 符号级别名称
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// 从 tracing 级别转换
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }

    /// 解析级别名称（大小写不敏感），无法识别时返回 `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Some(Self::Trace),
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" | "FATAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 对应的 tracing 过滤级别；CRITICAL 没有对应项，按 ERROR 处理
    pub fn to_level_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self {
            Self::Trace => LevelFilter::TRACE,
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 事件属性值
///
/// `Debug` 保存只能通过 `Debug` 渲染得到的不透明值，它和非有限浮点数
/// 一样无法直接编码为 JSON。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Debug(String),
}

impl FieldValue {
    /// 原生 JSON 表示；不可序列化的值返回 `None`
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value;
        match self {
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::I64(n) => Some(Value::from(*n)),
            Self::U64(n) => Some(Value::from(*n)),
            Self::F64(f) => serde_json::Number::from_f64(*f).map(Value::Number),
            Self::Str(s) => Some(Value::String(s.clone())),
            Self::Debug(_) => None,
        }
    }

    /// JSON 表示，不可序列化时退化为字符串形式
    pub fn to_json_lossy(&self) -> serde_json::Value {
        self.to_json()
            .unwrap_or_else(|| serde_json::Value::String(self.to_string()))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::I64(n) => write!(f, "{}", n),
            Self::U64(n) => write!(f, "{}", n),
            Self::F64(v) => write!(f, "{}", v),
            Self::Str(s) | Self::Debug(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::I64(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::U64(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// 日志事件
///
/// 调用点触发时刻的快照。sink 只读取它，从不修改。
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// 创建时间，Unix 秒
    pub created: f64,
    /// `created` 的毫秒部分
    pub msecs: f64,
    /// 相对库首次使用的毫秒数
    pub relative_created: f64,
    /// logger 名称
    pub name: String,
    /// 日志级别
    pub level: LogLevel,
    /// 原始消息模板
    pub msg: String,
    /// 原始消息参数
    pub args: Vec<FieldValue>,
    /// 源文件路径
    pub pathname: Option<String>,
    /// 源文件名
    pub filename: Option<String>,
    /// 模块路径
    pub module: Option<String>,
    /// 行号
    pub lineno: Option<u32>,
    /// 所在函数（最内层 span 名称）
    pub func_name: Option<String>,
    /// 进程 ID
    pub process: Option<u32>,
    /// 进程名称
    pub process_name: Option<String>,
    /// 线程 ID
    pub thread: Option<u64>,
    /// 线程名称
    pub thread_name: Option<String>,
    /// 调用方附加的字段
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEvent {
    /// 以当前时间、当前进程和线程创建事件
    pub fn new(name: impl Into<String>, level: LogLevel, msg: impl Into<String>) -> Self {
        let created = now_unix_seconds();
        let info = BackgroundInfo::new();
        Self {
            created,
            msecs: msecs_of(created),
            relative_created: relative_to_start(created),
            name: name.into(),
            level,
            msg: msg.into(),
            args: Vec::new(),
            pathname: None,
            filename: None,
            module: None,
            lineno: None,
            func_name: None,
            process: Some(info.pid),
            process_name: info.process_name,
            thread: Some(info.tid),
            thread_name: info.thread_name,
            fields: BTreeMap::new(),
        }
    }

    /// 设置创建时间并重新计算派生的时间属性
    pub fn with_created(mut self, created: f64) -> Self {
        self.created = created;
        self.msecs = msecs_of(created);
        self.relative_created = relative_to_start(created);
        self
    }

    pub fn with_args(mut self, args: Vec<FieldValue>) -> Self {
        self.args = args;
        self
    }

    /// 设置源文件路径和行号，文件名从路径中推导
    pub fn with_location(mut self, pathname: impl Into<String>, lineno: Option<u32>) -> Self {
        let pathname = pathname.into();
        self.filename = std::path::Path::new(&pathname)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned());
        self.pathname = Some(pathname);
        self.lineno = lineno;
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_func_name(mut self, func_name: impl Into<String>) -> Self {
        self.func_name = Some(func_name.into());
        self
    }

    /// 添加自定义字段
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// 用参数渲染消息模板，参数依次替换 `{}` 占位符
    pub fn get_message(&self) -> String {
        if self.args.is_empty() {
            return self.msg.clone();
        }

        let mut out = String::with_capacity(self.msg.len());
        let mut args = self.args.iter();
        let mut rest = self.msg.as_str();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }

    /// 按名称读取属性；内置属性优先于同名的自定义字段
    pub fn attribute(&self, key: &str) -> Option<FieldValue> {
        let value = match key {
            "name" => FieldValue::from(self.name.as_str()),
            "msg" => FieldValue::from(self.msg.as_str()),
            "args" => FieldValue::Debug(format!(
                "[{}]",
                self.args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            "levelname" => FieldValue::from(self.level.name()),
            "levelno" => FieldValue::from(self.level.levelno()),
            "pathname" => FieldValue::from(self.pathname.clone()),
            "filename" => FieldValue::from(self.filename.clone()),
            "module" => FieldValue::from(self.module.clone()),
            "lineno" => FieldValue::from(self.lineno),
            "func_name" => FieldValue::from(self.func_name.clone()),
            "created" => FieldValue::F64(self.created),
            "msecs" => FieldValue::F64(self.msecs),
            "relative_created" => FieldValue::F64(self.relative_created),
            "thread" => FieldValue::from(self.thread),
            "thread_name" => FieldValue::from(self.thread_name.clone()),
            "process" => FieldValue::from(self.process),
            "process_name" => FieldValue::from(self.process_name.clone()),
            _ => return self.fields.get(key).cloned(),
        };
        Some(value)
    }

    /// 枚举全部属性：先内置属性，后自定义字段
    ///
    /// 与内置属性同名的自定义字段会被跳过。
    pub fn attributes(&self) -> Vec<(String, FieldValue)> {
        let mut attrs: Vec<(String, FieldValue)> = CORE_ATTRIBUTES
            .iter()
            .filter_map(|key| self.attribute(key).map(|v| (key.to_string(), v)))
            .collect();

        attrs.extend(
            self.fields
                .iter()
                .filter(|(key, _)| !CORE_ATTRIBUTES.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        attrs
    }
}

fn msecs_of(created: f64) -> f64 {
    (created - created.trunc()) * 1000.0
}

fn relative_to_start(created: f64) -> f64 {
    (created - *START_TIME) * 1000.0
}
