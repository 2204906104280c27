//! # Spec Orchestrator Library / Spec Orchestrator 库
//!
//! This library distributes end-to-end spec files across parallel
//! machine × browser slots, balancing the slots with the durations recorded in
//! previous runs, and turns merged run reports back into those durations.
//!
//! 此库将端到端 spec 文件分配到并行的机器 × 浏览器槽位上，
//! 利用先前运行记录的时长来平衡各槽位，并将合并后的运行报告转换回这些时长。
//!
//! ## Modules / 模块
//!
//! - `core` - Scheduling core (aggregator, orderer, partitioner, planner) and slot execution
//! - `infra` - Process spawning and file system artifacts
//! - `reporting` - Console output and the HTML schedule report
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 调度核心（聚合器、排序器、划分器、计划器）与槽位执行
//! - `infra` - 进程派生和文件系统产物
//! - `reporting` - 控制台输出和 HTML 调度报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::models;
pub use core::{aggregator, orderer, partitioner, planner};

/// Picks the interface language.
///
/// An explicit choice wins; otherwise the system locale is used. The full
/// locale (e.g. "zh-CN") is tried first, then its language code, then "en".
///
/// 选择界面语言。显式指定的优先；否则使用系统区域设置。
/// 依次尝试完整区域（例如 "zh-CN"）、语言代码，最后回退到 "en"。
pub fn resolve_locale(explicit: Option<&str>) -> String {
    let locale = explicit
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split('-')
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
