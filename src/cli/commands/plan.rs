//! # Plan Command Module / 计划命令模块
//!
//! Prints the schedule a `run` would use without starting any container.
//! 打印 `run` 将会使用的调度计划，但不启动任何容器。

use anyhow::Result;
use std::path::PathBuf;

use crate::{
    cli::commands::{collect_candidates, load_config, store_path},
    core::{config::ConfigOverrides, planner},
    infra::{fs, t},
    reporting::{
        console::{self, print_schedule, sub_step},
        html::generate_html_report,
    },
};

/// Executes the plan command.
///
/// With `json` the schedule is written to stdout as JSON and nothing else is
/// printed, so the output can be piped.
///
/// 执行 plan 命令。使用 `json` 时调度计划以 JSON 写到 stdout，不打印其他内容，便于管道处理。
pub fn execute(
    config_path: PathBuf,
    overrides: ConfigOverrides,
    lang: Option<String>,
    html: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    if json {
        console::set_silent(true);
    }

    let (config, locale) = load_config(&config_path, overrides, lang.as_deref())?;
    config.validate()?;

    let candidates = collect_candidates(&config)?;
    let store = fs::load_duration_store(&store_path(&config));
    let plan = planner::plan_execution(
        &candidates,
        &config.browsers,
        config.parallelism,
        store.as_ref(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.schedule)?);
    } else {
        console::step(
            &t!(
                "run.candidates_found",
                locale = &locale,
                count = plan.candidate_count,
                history = plan.with_history_count
            ),
            false,
        );
        print_schedule(&plan.schedule, store.as_ref(), &locale);
    }

    if let Some(path) = html {
        generate_html_report(&plan.schedule, store.as_ref(), &path, &locale)?;
        sub_step(&t!("html_report_written", locale = &locale, path = path.display()));
    }
    Ok(())
}
