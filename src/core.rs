//! # Core Module / 核心模块
//!
//! This module contains the scheduling core of Spec Orchestrator: the data
//! models, configuration, report aggregation, spec ordering, slot partitioning
//! and planning, plus the slot execution engine built on top of them.
//!
//! 此模块包含 Spec Orchestrator 的调度核心：数据模型、配置、报告聚合、
//! spec 排序、槽位划分与计划，以及基于它们构建的槽位执行引擎。

pub mod aggregator;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod orderer;
pub mod partitioner;
pub mod planner;

// Re-exports
pub use aggregator::aggregate;
pub use config::{BrowserSet, OrchestratorConfig};
pub use error::SchedulingError;
pub use models::{DurationStore, Schedule, SlotResult};
pub use orderer::order;
pub use partitioner::partition;
pub use planner::schedule;
