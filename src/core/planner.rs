//! # Scheduling Planner Module / 调度计划模块
//!
//! Composes the orderer and the partitioner per browser to produce the slot
//! assignment of a run. Each browser is scheduled independently over its own
//! share of `parallelism` slots.
//!
//! 按浏览器组合排序器与划分器，生成一次运行的槽位分配。
//! 每个浏览器独立调度到其自身的 `parallelism` 个槽位上。

use crate::core::error::SchedulingError;
use crate::core::models::{BrowserSchedule, DurationStore, Schedule, spec_key};
use crate::core::orderer::order;
use crate::core::partitioner::partition;

/// Represents a complete execution plan for a run.
/// 表示一次运行的完整执行计划。
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// The per-browser slot assignment.
    /// 按浏览器的槽位分配。
    pub schedule: Schedule,
    /// Number of candidate specs scheduled for each browser.
    /// 每个浏览器调度的候选 spec 数量。
    pub candidate_count: usize,
    /// How many candidates had recorded durations.
    /// 有历史时长记录的候选数量。
    pub with_history_count: usize,
}

/// Schedules `candidates` for every browser in `browsers`.
///
/// A missing store schedules the candidates in their given order. The same
/// spec is scheduled once per browser; browsers never share slots.
///
/// 为 `browsers` 中的每个浏览器调度 `candidates`。
/// 没有存储时按给定顺序调度。同一个 spec 在每个浏览器上各调度一次，浏览器之间不共享槽位。
pub fn schedule(
    candidates: &[String],
    browsers: &[String],
    parallelism: usize,
    store: Option<&DurationStore>,
) -> Result<Schedule, SchedulingError> {
    let empty = DurationStore::default();
    let store = store.unwrap_or(&empty);

    let browsers = browsers
        .iter()
        .map(|browser| {
            let ordered = order(candidates, store, browser);
            Ok(BrowserSchedule {
                browser: browser.clone(),
                slots: partition(&ordered, parallelism)?,
            })
        })
        .collect::<Result<Vec<_>, SchedulingError>>()?;

    Ok(Schedule { browsers })
}

/// Creates the execution plan for a run.
/// 为一次运行创建执行计划。
pub fn plan_execution(
    candidates: &[String],
    browsers: &[String],
    parallelism: usize,
    store: Option<&DurationStore>,
) -> Result<ExecutionPlan, SchedulingError> {
    let schedule = schedule(candidates, browsers, parallelism, store)?;
    let with_history_count = store
        .map(|store| {
            candidates
                .iter()
                .filter(|spec| store.get(spec_key(spec)).is_some())
                .count()
        })
        .unwrap_or(0);

    Ok(ExecutionPlan {
        schedule,
        candidate_count: candidates.len(),
        with_history_count,
    })
}
