//! # Spec Orderer Module / Spec 排序模块
//!
//! Orders the candidate specs of one browser so that the ones with recorded
//! history come first, slowest first, followed by specs never seen before in
//! the order they were discovered.
//!
//! 对单个浏览器的候选 spec 排序：有历史记录的排在前面（最慢的优先），
//! 之后是从未出现过的 spec，保持发现时的顺序。

use crate::core::models::{DurationStore, spec_key};

/// Orders `candidates` for `browser` using the recorded durations in `store`.
///
/// Candidates are matched to records by their base name. Specs with a record are
/// sorted by descending duration, ties keeping the store's own order; specs
/// without one keep their relative order from `candidates`. Records for specs
/// that are no longer candidates are ignored.
///
/// 使用 `store` 中记录的时长为 `browser` 排序 `candidates`。
/// 候选项按基本名称匹配记录。有记录的按时长降序排列，相同时长保持存储中的顺序；
/// 没有记录的保持其在 `candidates` 中的相对顺序。已不在候选列表中的记录被忽略。
pub fn order(candidates: &[String], store: &DurationStore, browser: &str) -> Vec<String> {
    let index = store.index_for(browser);

    let mut with_history: Vec<(u64, usize, &String)> = Vec::new();
    let mut without_history: Vec<&String> = Vec::new();
    for spec in candidates {
        match index.get(spec_key(spec)) {
            Some(&(position, duration)) => with_history.push((duration, position, spec)),
            None => without_history.push(spec),
        }
    }

    with_history.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    with_history
        .into_iter()
        .map(|(_, _, spec)| spec)
        .chain(without_history)
        .cloned()
        .collect()
}
