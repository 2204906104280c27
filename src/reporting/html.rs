//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders the schedule of a run as a standalone HTML page: one section per
//! browser, one table per slot with each spec's recorded duration and the
//! slot's estimated total.
//!
//! 将一次运行的调度计划渲染为独立的 HTML 页面：每个浏览器一个部分，
//! 每个槽位一张表，列出每个 spec 的历史时长以及槽位的预估总时长。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::Path;

use crate::core::aggregator::format_minutes_seconds;
use crate::core::models::{DurationStore, Schedule, spec_key};
use crate::infra::t;
use crate::reporting::console::estimated_millis;

const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem; color: #24292f; }
h1 { margin-bottom: 0.25rem; }
.generated { color: #57606a; margin-bottom: 2rem; }
.browser { margin-bottom: 2.5rem; }
.slots { display: flex; flex-wrap: wrap; gap: 1rem; }
.slot { border: 1px solid #d0d7de; border-radius: 6px; padding: 0.75rem; min-width: 18rem; }
.slot h3 { margin: 0 0 0.5rem 0; font-size: 1rem; }
table { border-collapse: collapse; width: 100%; }
td { padding: 0.2rem 0.4rem; border-top: 1px solid #eaeef2; }
td.duration { text-align: right; font-variant-numeric: tabular-nums; }
.unknown { color: #8c959f; }
"#;

/// Renders the schedule page.
/// 渲染调度计划页面。
pub fn render_schedule_report(
    schedule: &Schedule,
    store: Option<&DurationStore>,
    locale: &str,
) -> Markup {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (maud::PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                div.generated { (t!("html_report.generated_at", locale = locale, time = &generated)) }
                @for browser in &schedule.browsers {
                    section.browser {
                        h2 { (browser.browser) }
                        @if browser.slots.is_empty() {
                            p.unknown { (t!("plan.no_specs", locale = locale)) }
                        }
                        div.slots {
                            @for (i, specs) in browser.slots.iter().enumerate() {
                                div.slot {
                                    h3 {
                                        "#" (i + 1) " · "
                                        (specs.len()) " " (t!("plan.specs", locale = locale)) " · ~"
                                        (format_minutes_seconds(estimated_millis(specs, &browser.browser, store)))
                                    }
                                    table {
                                        @for spec in specs {
                                            tr {
                                                td { (spec) }
                                                @match store.and_then(|s| s.get(spec_key(spec))) {
                                                    Some(record) => {
                                                        td.duration { (format_minutes_seconds(record.duration_for(&browser.browser))) }
                                                    }
                                                    None => {
                                                        td.duration.unknown { (t!("html_report.no_history", locale = locale)) }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Writes the schedule page to `output_path`.
///
/// # Errors / 错误
/// Fails when the file or its parent directory cannot be written.
/// 当无法写入文件或其父目录时失败。
pub fn generate_html_report(
    schedule: &Schedule,
    store: Option<&DurationStore>,
    output_path: &Path,
    locale: &str,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let page = render_schedule_report(schedule, store, locale);
    fs::write(output_path, page.into_string())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    Ok(())
}
