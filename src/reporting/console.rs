//! # Console Reporting Module / 控制台报告模块
//!
//! Step-style progress logging (`[*] step`, `[-] sub step`), the schedule and
//! duration tables, and the final slot summary. Everything printed here is
//! suppressed when the `SILENT` environment variable is set or `--silent` is
//! passed.
//!
//! 步骤式进度日志（`[*] 步骤`、`[-] 子步骤`）、调度与时长表格以及最终的槽位摘要。
//! 设置 `SILENT` 环境变量或传入 `--silent` 时，此处的所有输出都会被抑制。

use colored::*;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::aggregator::format_minutes_seconds;
use crate::core::models::{DurationStore, DurationSummaryEntry, Schedule, SlotResult, spec_key};
use crate::infra::t;

static SILENT: Lazy<AtomicBool> =
    Lazy::new(|| AtomicBool::new(std::env::var_os("SILENT").is_some()));

/// Silences (or re-enables) all console reporting.
pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

pub fn is_silent() -> bool {
    SILENT.load(Ordering::Relaxed)
}

/// Prints the start banner.
pub fn banner() {
    if is_silent() {
        return;
    }
    println!(
        "\n{}  {}\n",
        "SPEC ORCHESTRATOR".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// Prints a top-level step, optionally preceded by an empty line.
/// 打印顶层步骤，可选地在前面加一个空行。
pub fn step(message: &str, new_line: bool) {
    if is_silent() {
        return;
    }
    if new_line {
        println!();
    }
    println!("{} {}", "[*]".bold(), message);
}

/// Prints a detail line below the current step.
/// 在当前步骤下打印一行详情。
pub fn sub_step(message: &str) {
    if is_silent() {
        return;
    }
    println!("{} {}", "[-]".dimmed(), message);
}

/// Prints one browser's duration report as a table.
///
/// ```text
/// ------------------------- chrome -------------------------
///   specName                                 | duration
///   checkout.spec.js                         | 03:12
///   login.spec.js                            | 00:41
/// ```
pub fn print_duration_table(browser: &str, entries: &[DurationSummaryEntry], locale: &str) {
    if is_silent() {
        return;
    }
    println!("{} {} {}", "-".repeat(25), browser.bold(), "-".repeat(25));
    println!(
        "  {:<40} | {}",
        t!("report.column_spec", locale = locale),
        t!("report.column_duration", locale = locale)
    );
    for entry in entries {
        println!("  {:<40} | {}", entry.spec_name, entry.duration);
    }
}

/// Prints the slot assignment of every browser with estimated slot totals.
/// 打印每个浏览器的槽位分配以及每个槽位的预估总时长。
pub fn print_schedule(schedule: &Schedule, store: Option<&DurationStore>, locale: &str) {
    if is_silent() {
        return;
    }
    println!("\n{}", t!("plan.banner", locale = locale).bold());
    for browser in &schedule.browsers {
        println!("  {}", browser.browser.cyan().bold());
        if browser.slots.is_empty() {
            println!("    {}", t!("plan.no_specs", locale = locale).dimmed());
        }
        for (i, specs) in browser.slots.iter().enumerate() {
            let estimate = estimated_millis(specs, &browser.browser, store);
            println!(
                "    #{:<3} {:>3} {}  ~{}",
                i + 1,
                specs.len(),
                t!("plan.specs", locale = locale),
                format_minutes_seconds(estimate)
            );
            for spec in specs {
                println!("         {}", spec.dimmed());
            }
        }
    }
}

/// Sum of the recorded durations of `specs` for `browser`.
pub fn estimated_millis(specs: &[String], browser: &str, store: Option<&DurationStore>) -> u64 {
    store
        .map(|store| {
            specs
                .iter()
                .filter_map(|spec| store.get(spec_key(spec)))
                .map(|record| record.duration_for(browser))
                .sum()
        })
        .unwrap_or(0)
}

/// Prints a formatted summary of slot results.
///
/// ```text
/// --- Slot Summary ---
///   - Passed           | chrome#1             |     4m 2.31s
///   - Failed           | firefox#1            |   3m 58.10s  (retried)
/// ```
pub fn print_summary(results: &[SlotResult], locale: &str) {
    if is_silent() {
        return;
    }
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for result in results {
        let status_str = result.get_status_str(locale);
        let status_colored = match result {
            SlotResult::Passed { .. } => status_str.green(),
            SlotResult::Failed { .. } => status_str.red(),
            SlotResult::Cancelled { .. } => status_str.dimmed(),
        };
        let duration_str = result
            .get_duration()
            .map(|d| format!("{:.2?}", d))
            .unwrap_or_else(|| "N/A".to_string());
        let retried_str = if result.was_retried() {
            format!(" ({})", t!("report.retried", locale = locale))
        } else {
            String::new()
        };

        println!(
            "  - {:<18} | {:<20} | {:>10}{}",
            status_colored,
            result.slot_name(),
            duration_str,
            retried_str
        );
    }
}

/// Prints the captured output of every failed slot.
/// 打印每个失败槽位捕获的输出。
pub fn print_failure_details(failures: &[&SlotResult], locale: &str) {
    if failures.is_empty() || is_silent() {
        return;
    }

    println!("\n{}", t!("report.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            result.get_status_str(locale).red(),
            result.slot_name().cyan()
        );
        let output = result.get_output();
        if !output.is_empty() {
            println!("\n{}\n", output);
        }
        println!("{}", "-".repeat(80));
    }
}
