//! 实用工具模块
//!
//! 提供进程与线程信息的辅助函数

pub mod background_info;

pub use background_info::BackgroundInfo;
