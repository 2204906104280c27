//! # Reporting Module / 报告模块
//!
//! This module handles everything the orchestrator shows to people: step
//! logging, duration and schedule tables, the slot summary in the console, and
//! the HTML schedule report.
//!
//! 此模块处理编排器展示给用户的所有内容：步骤日志、时长与调度表格、
//! 控制台中的槽位摘要以及 HTML 调度报告。

pub mod console;
pub mod html;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use html::generate_html_report;
