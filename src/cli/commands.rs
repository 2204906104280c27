//! # Commands Module / 命令模块
//!
//! The subcommands of the CLI, plus the steps several of them share: loading
//! the configuration, collecting candidate specs and analysing a merged report.
//!
//! CLI 的子命令，以及多个子命令共享的步骤：加载配置、收集候选 spec、分析合并报告。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::aggregator::{aggregate, summarize};
use crate::core::config::{self, ConfigOverrides, OrchestratorConfig};
use crate::core::models::DurationStore;
use crate::infra::{fs, t};
use crate::reporting::console;

pub mod analyse;
pub mod init;
pub mod plan;
pub mod run;

/// Loads the configuration, applies overrides and selects the locale.
///
/// The locale comes from `--lang` when given, otherwise from the configuration,
/// otherwise from the system.
/// 区域设置优先取 `--lang`，其次取配置中的值，最后取系统区域设置。
pub(crate) fn load_config(
    path: &Path,
    overrides: ConfigOverrides,
    lang: Option<&str>,
) -> Result<(OrchestratorConfig, String)> {
    let path = fs::absolute_path(path)
        .with_context(|| t!("config.read_failed", path = path.display()).to_string())?;
    let mut config = config::load_config(&path)?;
    config.apply_overrides(overrides);
    config.expand_paths();

    let locale = crate::resolve_locale(lang.or(config.language.as_deref()));
    rust_i18n::set_locale(&locale);
    Ok((config, locale))
}

/// Collects the candidate specs: the configured list, or the ones discovered
/// under the specs home, filtered by tags.
///
/// 收集候选 spec：配置中的列表，或在 spec 目录下发现并按标签过滤的 spec。
pub(crate) fn collect_candidates(config: &OrchestratorConfig) -> Result<Vec<String>> {
    let home = Path::new(&config.specs_home_path);
    let specs = if !config.specs.is_empty() {
        config.specs.clone()
    } else {
        fs::discover_specs(home, &config.spec_extensions)?
    };
    Ok(fs::filter_by_tags(
        home,
        specs,
        &config.include_tags,
        &config.exclude_tags,
    ))
}

/// Location of the duration store for a configuration.
pub(crate) fn store_path(config: &OrchestratorConfig) -> PathBuf {
    PathBuf::from(&config.specs_execution_time_path)
}

/// Aggregates the merged report at `report_path`, refreshes the duration store
/// at `store_path` and writes and prints the per-browser summaries.
///
/// Returns the refreshed store, or `None` when there was no report to analyse.
///
/// 聚合 `report_path` 处的合并报告，刷新 `store_path` 处的时长存储，
/// 并写出和打印每个浏览器的摘要。没有可分析的报告时返回 `None`。
pub(crate) fn analyse_report(
    report_path: &Path,
    store_path: &Path,
    config: &OrchestratorConfig,
    locale: &str,
) -> Result<Option<DurationStore>> {
    console::step(&t!("analyse.step", locale = locale), true);

    let Some(report) = fs::read_merged_report(report_path)? else {
        console::sub_step(&t!(
            "analyse.no_report",
            locale = locale,
            path = report_path.display()
        ));
        return Ok(None);
    };

    let browsers = config.browser_set();
    let fresh = aggregate(&report, DurationStore::new(), &browsers);
    let existing = fs::load_duration_store(store_path).unwrap_or_default();
    let updated = existing.refresh(fresh.clone());
    fs::save_duration_store(store_path, &updated)?;
    console::sub_step(&t!(
        "analyse.store_written",
        locale = locale,
        path = store_path.display()
    ));

    let summary_dir = match store_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    for browser in browsers.known() {
        let entries = summarize(&fresh, browser);
        let path = fs::write_duration_summary(&summary_dir, browser, &entries)?;
        console::print_duration_table(browser, &entries, locale);
        console::sub_step(&t!(
            "analyse.summary_written",
            locale = locale,
            path = path.display()
        ));
    }

    Ok(Some(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::tempdir;

    #[test]
    fn configured_specs_take_precedence_over_discovery() {
        let dir = tempdir().unwrap();
        stdfs::write(dir.path().join("found.spec.js"), "").unwrap();
        let mut config = OrchestratorConfig {
            specs_home_path: dir.path().display().to_string(),
            ..Default::default()
        };
        assert_eq!(collect_candidates(&config).unwrap(), vec!["found.spec.js"]);

        config.specs = vec!["b.js".into(), "a.js".into()];
        assert_eq!(collect_candidates(&config).unwrap(), vec!["b.js", "a.js"]);
    }

    #[test]
    fn locale_falls_back_from_flag_to_config_to_system() {
        let dir = tempdir().unwrap();
        let pinned = dir.path().join("pinned.toml");
        stdfs::write(&pinned, "language = \"zh-CN\"\nbrowsers = [\"chrome\"]\n").unwrap();
        let unset = dir.path().join("unset.toml");
        stdfs::write(&unset, "browsers = [\"chrome\"]\n").unwrap();

        let (_, locale) = load_config(&pinned, ConfigOverrides::default(), Some("en")).unwrap();
        assert_eq!(locale, "en");
        let (_, locale) = load_config(&pinned, ConfigOverrides::default(), None).unwrap();
        assert_eq!(locale, "zh-CN");
        let (config, locale) = load_config(&unset, ConfigOverrides::default(), None).unwrap();
        assert_eq!(config.language, None);
        assert_eq!(locale, crate::resolve_locale(None));

        rust_i18n::set_locale("en");
    }

    #[test]
    fn analysis_refreshes_store_and_writes_summaries() {
        console::set_silent(true);
        let dir = tempdir().unwrap();
        let report_path = dir.path().join("mochawesome.json");
        stdfs::write(
            &report_path,
            r#"{"results":[{"file":"/e2e/login.spec.js","suites":[{"title":"Firefox","duration":"2000"}]}]}"#,
        )
        .unwrap();
        let store_path = dir.path().join("history/specsExecutionTime.json");
        stdfs::create_dir_all(store_path.parent().unwrap()).unwrap();
        stdfs::write(
            &store_path,
            r#"[{"specName":"old.spec.js","data":[{"browser":"chrome","duration":5}]}]"#,
        )
        .unwrap();

        let config = OrchestratorConfig::default();
        let updated = analyse_report(&report_path, &store_path, &config, "en")
            .unwrap()
            .unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(updated.get("login.spec.js").unwrap().duration_for("firefox"), 2000);
        assert_eq!(fs::load_duration_store(&store_path), Some(updated));

        let firefox = stdfs::read_to_string(dir.path().join("history/specsExecutionTime-firefox.json")).unwrap();
        assert!(firefox.contains("\"specName\": \"login.spec.js\""));
        assert!(firefox.contains("\"duration\": \"00:02\""));
        assert!(dir.path().join("history/specsExecutionTime-chrome.json").is_file());
    }

    #[test]
    fn missing_report_is_not_an_error() {
        console::set_silent(true);
        let dir = tempdir().unwrap();
        let result = analyse_report(
            &dir.path().join("absent.json"),
            &dir.path().join("store.json"),
            &OrchestratorConfig::default(),
            "en",
        )
        .unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("store.json").exists());
    }
}
