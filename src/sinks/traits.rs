//! logstore Sink Traits
//!
//! 定义了统一的 Sink trait 接口，[`crate::core::layer::SinkLayer`] 通过它把
//! 日志事件交给具体的输出目标。
//!
//! 所有调用都是同步的：一次 `send_event` 就是一次完整的写入，
//! 调用返回时数据已经持久化。
//!
//! # 使用示例
//!
//! ```rust
//! use logstore::sinks::traits::{RecordSink, SinkState};
//! use logstore::core::event::LogEvent;
//! use logstore::Result;
//!
//! #[derive(Debug)]
//! struct PrintSink;
//!
//! impl RecordSink for PrintSink {
//!     fn send_event(&self, event: &LogEvent) -> Result<()> {
//!         println!("{} {}", event.level, event.get_message());
//!         Ok(())
//!     }
//!
//!     fn shutdown(&self) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn state(&self) -> SinkState {
//!         SinkState::Open
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "print"
//!     }
//! }
//! ```

use crate::core::event::LogEvent;
use crate::error::Result;
use std::fmt::Debug;

/// Sink 生命周期状态
///
/// 只有一次 `Open -> Closed` 的转换，没有回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// 接受写入
    Open,
    /// 已关闭，不再期望写入
    Closed,
}

/// 基础 Sink trait
///
/// 宿主日志框架会串行化对同一个 sink 的调用，实现无需自行加锁，
/// 但类型本身必须可以在线程间共享。
pub trait RecordSink: Send + Sync + Debug {
    /// 写入一个日志事件
    ///
    /// # 返回值
    ///
    /// 成功时返回 `Ok(())`，底层存储失败时原样返回错误，不做重试
    fn send_event(&self, event: &LogEvent) -> Result<()>;

    /// 关闭 sink
    ///
    /// 尽力完成最后一次刷新，无论成功与否都进入 `Closed` 状态。
    fn shutdown(&self) -> Result<()>;

    /// 当前状态
    fn state(&self) -> SinkState;

    /// 是否已关闭
    fn is_closed(&self) -> bool {
        self.state() == SinkState::Closed
    }

    /// 检查 sink 是否健康
    fn is_healthy(&self) -> bool {
        !self.is_closed()
    }

    /// 获取 sink 的名称
    fn name(&self) -> &'static str;

    /// 获取 sink 的统计信息
    fn stats(&self) -> String {
        format!("Sink: {}, State: {:?}", self.name(), self.state())
    }
}
