//! # Analyse Command Module / 分析命令模块
//!
//! Feeds an existing merged report into the duration history without running
//! anything.
//!
//! 将已有的合并报告写入时长历史，不运行任何测试。

use anyhow::Result;
use std::path::PathBuf;

use crate::{
    cli::commands::{analyse_report, load_config, store_path},
    core::config::{ConfigOverrides, OrchestratorConfig},
    infra::t,
    reporting::console,
};

/// Executes the analyse command.
///
/// A missing configuration file falls back to the defaults, so a report can
/// be analysed outside of a configured project. `store` overrides the
/// configured store location.
///
/// 执行 analyse 命令。配置文件不存在时使用默认值，因此可以在未配置的项目之外分析报告。
/// `store` 会覆盖配置中的存储位置。
pub fn execute(
    config_path: PathBuf,
    report: PathBuf,
    store: Option<PathBuf>,
    lang: Option<String>,
) -> Result<()> {
    let (config, locale) = if config_path.is_file() {
        load_config(&config_path, ConfigOverrides::default(), lang.as_deref())?
    } else {
        let config = OrchestratorConfig::default();
        let locale = crate::resolve_locale(lang.as_deref().or(config.language.as_deref()));
        rust_i18n::set_locale(&locale);
        (config, locale)
    };

    let store = store.unwrap_or_else(|| store_path(&config));
    if analyse_report(&report, &store, &config, &locale)?.is_none() {
        anyhow::bail!(t!("analyse.no_report", locale = &locale, path = report.display()).to_string());
    }
    console::step(&t!("analyse.done", locale = &locale), true);
    Ok(())
}
