//! sink 的内部诊断与指标。
//!
//! 此模块提供了对 sink 写入情况的可观测性。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 内部诊断与指标数据结构。
///
/// 使用原子操作确保线程安全。
#[derive(Debug)]
pub struct Diagnostics {
    /// 创建时间
    start_time: Instant,

    /// 已写入并提交的行数
    rows_written: AtomicU64,

    /// 写入失败次数
    sink_errors: AtomicU64,
}

/// 诊断数据的快照，用于外部查询。
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsSnapshot {
    /// 运行时间
    pub uptime: Duration,

    /// 已写入并提交的行数
    pub rows_written: u64,

    /// 写入失败次数
    pub sink_errors: u64,

    /// 写入成功率（百分比）
    pub success_rate_percent: f64,
}

impl Diagnostics {
    /// 创建新的诊断实例。
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            rows_written: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
        }
    }

    /// 增加已写入行计数。
    pub fn increment_rows_written(&self) {
        self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加写入失败计数。
    pub fn increment_sink_errors(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取当前诊断数据的快照。
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let rows_written = self.rows_written.load(Ordering::Relaxed);
        let sink_errors = self.sink_errors.load(Ordering::Relaxed);
        let attempts = rows_written + sink_errors;

        let success_rate_percent = if attempts > 0 {
            (rows_written as f64 / attempts as f64) * 100.0
        } else {
            100.0
        };

        DiagnosticsSnapshot {
            uptime: self.start_time.elapsed(),
            rows_written,
            sink_errors,
            success_rate_percent,
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
