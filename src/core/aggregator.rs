//! # Report Aggregator Module / 报告聚合模块
//!
//! Turns a merged test report into spec durations. Every suite node, at any
//! depth, is attributed to a browser by its own title and its duration is added
//! to the owning spec's accumulator for that browser.
//!
//! 将合并后的测试报告转换为 spec 时长。任意深度的每个套件节点都根据其自身标题
//! 归属到某个浏览器，其时长累加到所属 spec 在该浏览器上的累计值。

use crate::core::config::BrowserSet;
use crate::core::models::{
    DurationStore, DurationSummaryEntry, MergedReport, SpecDurationRecord, SuiteNode, spec_key,
};

/// Adds the durations found in `report` to `store` and returns the updated store.
///
/// Results without a file path are ignored. Malformed durations count as zero and
/// titles that name no known browser are attributed to the default browser.
///
/// 将 `report` 中的时长累加到 `store` 并返回更新后的存储。
/// 没有文件路径的结果会被忽略。格式错误的时长计为零，
/// 未命名已知浏览器的标题归属到默认浏览器。
pub fn aggregate(
    report: &MergedReport,
    mut store: DurationStore,
    browsers: &BrowserSet,
) -> DurationStore {
    for result in &report.results {
        let key = spec_key(&result.file);
        if key.is_empty() {
            continue;
        }
        let record = store.ensure_record(key, browsers);
        accumulate(&result.suites, record, browsers);
    }
    store
}

fn accumulate(suites: &[SuiteNode], record: &mut SpecDurationRecord, browsers: &BrowserSet) {
    for suite in suites {
        record.add(browsers.match_title(&suite.title), suite.duration_ms());
        accumulate(&suite.children, record, browsers);
    }
}

/// Builds the human-readable duration report for one browser, slowest first.
/// 构建单个浏览器的可读时长报告，最慢的排在最前。
pub fn summarize(store: &DurationStore, browser: &str) -> Vec<DurationSummaryEntry> {
    let mut records: Vec<&SpecDurationRecord> = store.records().iter().collect();
    records.sort_by(|a, b| b.duration_for(browser).cmp(&a.duration_for(browser)));
    records
        .into_iter()
        .map(|record| DurationSummaryEntry {
            spec_name: record.spec_name.clone(),
            duration: format_minutes_seconds(record.duration_for(browser)),
        })
        .collect()
}

/// Renders milliseconds as `MM:SS`, rounding to the nearest second.
/// 将毫秒渲染为 `MM:SS`，四舍五入到最近的秒。
pub fn format_minutes_seconds(millis: u64) -> String {
    let total_seconds = (millis + 500) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
