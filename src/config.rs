//! logstore 配置模块
//!
//! 定义 SQLite sink 的配置结构，支持从 TOML 字符串或文件加载并校验。

use crate::core::event::LogLevel;
use crate::core::formatter::{DEFAULT_TEMPLATE, DEFAULT_TIMESTAMP_FORMAT};
use crate::error::{LogStoreError, Result};
use crate::sinks::sqlite::schema::{SchemaVariant, DEFAULT_TABLE_NAME};
use serde::Deserialize;
use std::path::Path;

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}
fn default_format() -> String {
    DEFAULT_TEMPLATE.to_string()
}
fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

/// SQLite sink 配置
///
/// 连接本身不属于配置，由调用方打开后传入。
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SqliteSinkConfig {
    /// 目标表名，原样拼接进 SQL
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default)]
    pub schema: SchemaVariant,
    /// 全局安装时的最低级别，`None` 表示不过滤
    pub level: Option<String>,
    /// 消息模板，占位符为 `{属性名}`
    #[serde(default = "default_format")]
    pub format: String,
    /// `{asctime}` 使用的 chrono 格式
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for SqliteSinkConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            schema: SchemaVariant::default(),
            level: None,
            format: default_format(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl SqliteSinkConfig {
    /// 解析后的最低级别
    pub fn min_level(&self) -> Result<Option<LogLevel>> {
        match &self.level {
            None => Ok(None),
            Some(level) => LogLevel::parse(level)
                .map(Some)
                .ok_or_else(|| LogStoreError::InvalidLogLevel(level.clone())),
        }
    }
}

/// 从 TOML 文件加载 `SqliteSinkConfig`。
pub fn load_config_from_file(path: &Path) -> Result<SqliteSinkConfig> {
    if !path.exists() {
        return Err(LogStoreError::ConfigFileMissing(
            path.to_string_lossy().into_owned(),
        ));
    }

    let config_str = std::fs::read_to_string(path)?;
    load_config_from_str(&config_str)
}

/// 从 TOML 字符串加载 `SqliteSinkConfig`。
pub fn load_config_from_str(config_str: &str) -> Result<SqliteSinkConfig> {
    let config: SqliteSinkConfig = toml::from_str(config_str)?;

    Ok(config)
}

/// 验证配置的有效性。
pub fn validate_config(config: &SqliteSinkConfig) -> Result<()> {
    if config.table_name.trim().is_empty() {
        return Err(LogStoreError::config("表名不能为空"));
    }

    config.min_level()?;

    Ok(())
}
