//! 消息格式化
//!
//! sink 写入前用调用方提供的模板渲染消息文本。模板中的 `{属性名}` 会被
//! 替换为事件属性，`{message}` 是渲染后的消息，`{asctime}` 是按
//! `timestamp_format` 格式化的创建时间。无法识别的占位符原样保留，
//! `{{` 和 `}}` 用于转义花括号。

use crate::core::event::LogEvent;
use std::fmt::Write;

/// 默认模板，只输出消息本身
pub const DEFAULT_TEMPLATE: &str = "{message}";

/// 默认时间格式
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 基于模板的消息格式化器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormatter {
    template: String,
    timestamp_format: String,
}

impl MessageFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// 设置 `{asctime}` 使用的 chrono 时间格式
    pub fn with_timestamp_format(mut self, timestamp_format: impl Into<String>) -> Self {
        self.timestamp_format = timestamp_format.into();
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// 渲染事件
    pub fn format(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(self.template.len() + event.msg.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('{') {
                if let Some(end) = tail.find('}').filter(|&end| !tail[1..end].contains('{')) {
                    let key = &tail[1..end];
                    match self.resolve(key, event) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(&tail[..=end]),
                    }
                    rest = &tail[end + 1..];
                    continue;
                }
            }

            // 孤立的花括号
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }

        out.push_str(rest);
        out
    }

    fn resolve(&self, key: &str, event: &LogEvent) -> Option<String> {
        match key {
            "message" => Some(event.get_message()),
            "asctime" => self.asctime(event.created),
            _ => event.attribute(key).map(|value| value.to_string()),
        }
    }

    fn asctime(&self, created: f64) -> Option<String> {
        let dt = chrono::DateTime::from_timestamp_micros((created * 1_000_000.0) as i64)?;
        let mut out = String::new();
        // 非法的格式串在写入时报错，此时保留占位符
        write!(out, "{}", dt.format(&self.timestamp_format)).ok()?;
        Some(out)
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}
