//! # File System Operations Module / 文件系统操作模块
//!
//! This module reads and writes the JSON artifacts the scheduler works with
//! (duration store, merged report, duration summaries) and discovers spec
//! files on disk.
//!
//! 此模块读写调度器使用的 JSON 产物（时长存储、合并报告、时长摘要），
//! 并在磁盘上发现 spec 文件。

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::models::{DurationStore, DurationSummaryEntry, MergedReport};

/// Loads the duration store.
///
/// Returns `None` when the file does not exist or cannot be parsed, in which
/// case scheduling proceeds without history.
///
/// 加载时长存储。文件不存在或无法解析时返回 `None`，此时调度在没有历史的情况下进行。
pub fn load_duration_store(path: &Path) -> Option<DurationStore> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Writes the duration store, replacing any previous file.
/// 写入时长存储，替换之前的文件。
pub fn save_duration_store(path: &Path, store: &DurationStore) -> Result<()> {
    write_json_file(path, store)
}

/// Name of the per-browser duration summary file.
pub fn summary_file_name(browser: &str) -> String {
    format!("specsExecutionTime-{}.json", browser)
}

/// Writes one browser's duration summary into `dir` and returns its path.
/// 将单个浏览器的时长摘要写入 `dir` 并返回其路径。
pub fn write_duration_summary(
    dir: &Path,
    browser: &str,
    entries: &[DurationSummaryEntry],
) -> Result<PathBuf> {
    let path = dir.join(summary_file_name(browser));
    write_json_file(&path, &entries)?;
    Ok(path)
}

/// Reads a merged report. A missing file is `Ok(None)`.
/// 读取合并报告。文件不存在时返回 `Ok(None)`。
pub fn read_merged_report(path: &Path) -> Result<Option<MergedReport>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report: {}", path.display()))?;
    Ok(Some(report))
}

/// Serializes `value` as pretty JSON to `path`.
///
/// The content goes to a temporary file in the same directory first and is then
/// moved over the target, so readers never observe a half-written artifact.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let json = serde_json::to_string_pretty(value)?;
    let mut file = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    file.write_all(json.as_bytes())?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Recursively collects spec files under `home`.
///
/// A file counts as a spec when its name ends with one of `extensions`. Paths are
/// returned relative to `home` with `/` separators, directory entries sorted by
/// name so discovery order is stable between runs.
///
/// 递归收集 `home` 下的 spec 文件。文件名以 `extensions` 之一结尾即视为 spec。
/// 返回相对于 `home` 的路径（使用 `/` 分隔），目录项按名称排序，以保证发现顺序稳定。
pub fn discover_specs(home: &Path, extensions: &[String]) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(home).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to list specs in {}", home.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            continue;
        }
        let relative = entry.path().strip_prefix(home).unwrap_or(entry.path());
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        found.push(parts.join("/"));
    }
    Ok(found)
}

/// Filters specs by tags mentioned in their source.
///
/// With `include` non-empty only specs mentioning at least one include tag are
/// kept; specs mentioning any `exclude` tag are dropped. A spec whose file cannot
/// be read is kept only when no include tags are required.
///
/// 按源码中提及的标签过滤 spec。`include` 非空时只保留至少提及一个包含标签的 spec；
/// 提及任一 `exclude` 标签的 spec 被丢弃。无法读取的文件仅在不要求包含标签时保留。
pub fn filter_by_tags(
    home: &Path,
    specs: Vec<String>,
    include: &[String],
    exclude: &[String],
) -> Vec<String> {
    if include.is_empty() && exclude.is_empty() {
        return specs;
    }
    specs
        .into_iter()
        .filter(|spec| match fs::read_to_string(home.join(spec)) {
            Ok(source) => {
                let included =
                    include.is_empty() || include.iter().any(|tag| source.contains(tag.as_str()));
                let excluded = exclude.iter().any(|tag| source.contains(tag.as_str()));
                included && !excluded
            }
            Err(_) => include.is_empty(),
        })
        .collect()
}

/// Gets the absolute path from a potentially relative path.
///
/// # Arguments
/// * `path` - Path to canonicalize
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}
