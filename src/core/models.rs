//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared by the scheduling core and the
//! execution layer: the persisted duration store, the merged test report tree,
//! the per-browser slot schedule and the outcome of running a slot.
//!
//! 此模块定义了调度核心与执行层共享的数据结构：
//! 持久化的时长存储、合并后的测试报告树、按浏览器划分的槽位计划以及槽位运行结果。

use crate::core::config::BrowserSet;
use crate::infra::t;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Returns the key a spec is stored under: the last segment of its path.
/// 返回 spec 在存储中的键：其路径的最后一段。
pub fn spec_key(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Accumulated duration of one spec for one browser, in milliseconds.
/// 某个 spec 在某个浏览器上的累计时长（毫秒）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserDuration {
    pub browser: String,
    #[serde(default)]
    pub duration: u64,
}

/// Historical timing of a single spec file across every known browser.
/// 单个 spec 文件在所有已知浏览器上的历史耗时。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDurationRecord {
    /// Base name of the spec file / spec 文件的基本名称
    pub spec_name: String,
    /// One entry per browser / 每个浏览器一条
    #[serde(default)]
    pub data: Vec<BrowserDuration>,
}

impl SpecDurationRecord {
    /// Creates a record with a zero entry for every known browser.
    /// 创建一条记录，每个已知浏览器的时长为零。
    pub fn new(spec_name: impl Into<String>, browsers: &BrowserSet) -> Self {
        Self {
            spec_name: spec_name.into(),
            data: browsers
                .known()
                .iter()
                .map(|browser| BrowserDuration {
                    browser: browser.clone(),
                    duration: 0,
                })
                .collect(),
        }
    }

    /// Recorded duration for `browser`, zero when the browser was never seen.
    /// 指定浏览器的记录时长，从未出现过时为零。
    pub fn duration_for(&self, browser: &str) -> u64 {
        self.data
            .iter()
            .find(|item| item.browser.eq_ignore_ascii_case(browser))
            .map(|item| item.duration)
            .unwrap_or(0)
    }

    /// Adds `millis` to the accumulator of `browser`, creating the entry if needed.
    /// 将 `millis` 累加到指定浏览器，必要时创建该条目。
    pub fn add(&mut self, browser: &str, millis: u64) {
        match self
            .data
            .iter_mut()
            .find(|item| item.browser.eq_ignore_ascii_case(browser))
        {
            Some(item) => item.duration = item.duration.saturating_add(millis),
            None => self.data.push(BrowserDuration {
                browser: browser.to_string(),
                duration: millis,
            }),
        }
    }

    /// Fills in zero entries for known browsers missing from this record.
    fn complete(&mut self, browsers: &BrowserSet) {
        for browser in browsers.known() {
            if !self.data.iter().any(|item| &item.browser == browser) {
                self.data.push(BrowserDuration {
                    browser: browser.clone(),
                    duration: 0,
                });
            }
        }
    }
}

/// The persisted table of per-spec, per-browser durations.
///
/// Serialized as a JSON array of records. The order of the array is meaningful:
/// it breaks ties when specs with equal durations are ordered.
///
/// 持久化的按 spec、按浏览器的时长表。
/// 序列化为记录的 JSON 数组。数组顺序有意义：当时长相同时用于决定先后。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationStore {
    records: Vec<SpecDurationRecord>,
}

impl DurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SpecDurationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SpecDurationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, spec_name: &str) -> Option<&SpecDurationRecord> {
        self.records.iter().find(|r| r.spec_name == spec_name)
    }

    /// Position of the record in the store, used as the tie-break order.
    pub fn position(&self, spec_name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.spec_name == spec_name)
    }

    /// Returns the record for `spec_name`, creating a zeroed one on first sight.
    /// 返回 `spec_name` 对应的记录，首次出现时创建一条全零记录。
    pub fn ensure_record(
        &mut self,
        spec_name: &str,
        browsers: &BrowserSet,
    ) -> &mut SpecDurationRecord {
        let index = match self.position(spec_name) {
            Some(index) => index,
            None => {
                self.records.push(SpecDurationRecord::new(spec_name, browsers));
                self.records.len() - 1
            }
        };
        let record = &mut self.records[index];
        record.complete(browsers);
        record
    }

    /// Builds a lookup from spec name to `(store position, duration for browser)`.
    /// The first record wins when a name appears twice.
    pub fn index_for(&self, browser: &str) -> HashMap<&str, (usize, u64)> {
        let mut index = HashMap::with_capacity(self.records.len());
        for (position, record) in self.records.iter().enumerate() {
            index
                .entry(record.spec_name.as_str())
                .or_insert((position, record.duration_for(browser)));
        }
        index
    }

    /// Merges the results of a fresh aggregation into this store.
    ///
    /// Records present in `fresh` replace the stored record of the same spec in
    /// place; unseen specs are appended. Records absent from `fresh` are kept.
    ///
    /// 将新一轮聚合的结果合并到当前存储。
    /// `fresh` 中的记录原位替换同名记录；新 spec 追加到末尾；`fresh` 中没有的记录保留。
    pub fn refresh(mut self, fresh: DurationStore) -> DurationStore {
        for record in fresh.records {
            match self.position(&record.spec_name) {
                Some(index) => self.records[index] = record,
                None => self.records.push(record),
            }
        }
        self
    }
}

/// A node of the merged report's suite tree.
/// 合并报告中套件树的一个节点。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SuiteNode {
    #[serde(default)]
    pub title: String,
    /// Raw duration as found in the report; numeric strings and numbers are accepted.
    /// 报告中的原始时长；接受数字字符串和数字。
    #[serde(default)]
    pub duration: serde_json::Value,
    #[serde(default, rename = "suites", deserialize_with = "null_as_empty")]
    pub children: Vec<SuiteNode>,
}

impl SuiteNode {
    /// This node's own duration in milliseconds; malformed values count as zero.
    /// 此节点自身的时长（毫秒）；格式错误的值计为零。
    pub fn duration_ms(&self) -> u64 {
        parse_duration_ms(&self.duration)
    }
}

/// Interprets a report duration the way an integer-prefix parse would:
/// `"120"` and `"120ms"` give 120, `12.9` gives 12, anything else or negative gives 0.
pub fn parse_duration_ms(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
            .unwrap_or(0),
        serde_json::Value::String(s) => {
            let digits: String = s
                .trim_start()
                .trim_start_matches('+')
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// One spec file's entry in a merged report.
/// 合并报告中某个 spec 文件的条目。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportResult {
    #[serde(default)]
    pub file: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suites: Vec<SuiteNode>,
}

/// The merged mochawesome report; only the parts the aggregator reads are modelled.
/// 合并后的 mochawesome 报告；只建模聚合器读取的部分。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MergedReport {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<ReportResult>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A human-readable line of the per-browser duration report.
/// 按浏览器的时长报告中的一行可读条目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationSummaryEntry {
    pub spec_name: String,
    /// Rendered as `MM:SS` / 以 `MM:SS` 形式呈现
    pub duration: String,
}

/// The slot assignment of one browser: each inner list is one slot's specs.
/// 单个浏览器的槽位分配：每个内层列表是一个槽位的 spec。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSchedule {
    pub browser: String,
    pub slots: Vec<Vec<String>>,
}

/// The full schedule for a run, in configured browser order.
/// 一次运行的完整计划，按配置的浏览器顺序排列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub browsers: Vec<BrowserSchedule>,
}

impl Schedule {
    /// Slots for `browser`, empty when the browser is not scheduled.
    pub fn slots_for(&self, browser: &str) -> &[Vec<String>] {
        self.browsers
            .iter()
            .find(|b| b.browser == browser)
            .map(|b| b.slots.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of populated slots across all browsers.
    pub fn slot_count(&self) -> usize {
        self.browsers.iter().map(|b| b.slots.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }

    /// Iterates `(browser, slot index within browser, specs)` in schedule order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (&str, usize, &[String])> {
        self.browsers.iter().flat_map(|b| {
            b.slots
                .iter()
                .enumerate()
                .map(move |(i, specs)| (b.browser.as_str(), i, specs.as_slice()))
        })
    }
}

/// Enumerates why a slot did not succeed.
/// 枚举槽位未成功的原因。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FailureReason {
    /// The runner process exited with a non-zero status.
    /// 运行进程以非零状态退出。
    RunnerFailed,
    /// The slot exceeded the configured timeout.
    /// 槽位超出了配置的超时时间。
    Timeout,
    /// The process could not be started at all.
    /// 进程根本无法启动。
    SpawnFailed,
}

/// Final outcome of one slot.
/// 单个槽位的最终结果。
#[derive(Debug, Clone)]
pub enum SlotResult {
    Passed {
        /// Name of the slot (`<browser>#<n>`) / 槽位名称
        slot: String,
        output: String,
        duration: Duration,
        /// `true` when the slot only passed on its reconnect retry.
        /// 槽位仅在重连重试后才通过时为 `true`。
        retried: bool,
    },
    Failed {
        slot: String,
        output: String,
        reason: FailureReason,
        duration: Duration,
        retried: bool,
    },
    /// The run was interrupted before the slot settled.
    /// 运行在槽位结束前被中断。
    Cancelled { slot: String },
}

impl SlotResult {
    pub fn slot_name(&self) -> &str {
        match self {
            SlotResult::Passed { slot, .. }
            | SlotResult::Failed { slot, .. }
            | SlotResult::Cancelled { slot } => slot,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, SlotResult::Passed { .. })
    }

    pub fn get_duration(&self) -> Option<Duration> {
        match self {
            SlotResult::Passed { duration, .. } | SlotResult::Failed { duration, .. } => {
                Some(*duration)
            }
            SlotResult::Cancelled { .. } => None,
        }
    }

    pub fn was_retried(&self) -> bool {
        match self {
            SlotResult::Passed { retried, .. } | SlotResult::Failed { retried, .. } => *retried,
            SlotResult::Cancelled { .. } => false,
        }
    }

    pub fn get_output(&self) -> &str {
        match self {
            SlotResult::Passed { output, .. } | SlotResult::Failed { output, .. } => output,
            SlotResult::Cancelled { .. } => "",
        }
    }

    /// Gets the status of the slot as a localized string for display.
    /// 以本地化字符串形式获取槽位状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            SlotResult::Passed { .. } => t!("report.status_passed", locale = locale).to_string(),
            SlotResult::Failed { reason, .. } => match reason {
                FailureReason::Timeout => t!("report.status_timeout", locale = locale).to_string(),
                FailureReason::SpawnFailed => {
                    t!("report.status_spawn_failed", locale = locale).to_string()
                }
                FailureReason::RunnerFailed => {
                    t!("report.status_failed", locale = locale).to_string()
                }
            },
            SlotResult::Cancelled { .. } => {
                t!("report.status_cancelled", locale = locale).to_string()
            }
        }
    }
}
