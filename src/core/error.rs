//! # Scheduling Errors / 调度错误
//!
//! The scheduling core degrades almost every anomaly to a sensible default
//! (empty history, zero duration, default browser). The only condition it
//! reports back to the caller is a slot count that cannot produce a partition.
//!
//! 调度核心几乎会把所有异常降级为合理的默认值（空历史、零时长、默认浏览器）。
//! 唯一返回给调用方的错误是无法产生有效划分的槽位数量。

use thiserror::Error;

/// Errors raised by the scheduling core.
/// 调度核心产生的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// The requested number of slots is below one.
    /// 请求的槽位数量小于一。
    #[error("invalid slot count {slots}: at least one slot is required")]
    InvalidSlotCount { slots: usize },
}
