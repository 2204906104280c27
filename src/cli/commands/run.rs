//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: it schedules the specs, starts one
//! runner container per populated slot, waits for all of them, tears the
//! containers down, generates the reports and finally refreshes the duration
//! history used by the next run.
//!
//! 此模块实现 `run` 命令：调度 spec，为每个非空槽位启动一个运行容器，等待全部结束，
//! 拆除容器，生成报告，最后刷新供下一次运行使用的时长历史。

use anyhow::{Context, Result};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    cli::commands::{analyse_report, collect_candidates, load_config, store_path},
    core::{
        config::{ConfigOverrides, OrchestratorConfig},
        execution::{SlotRunner, run_slots},
        planner,
    },
    infra::{
        command::{self, ComposeProject, SlotCommand},
        fs, t,
    },
    reporting::{
        console::{self, print_failure_details, print_schedule, print_summary, step, sub_step},
        html::generate_html_report,
    },
};

/// Arguments of the `run` command.
/// `run` 命令的参数。
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub config: PathBuf,
    pub overrides: ConfigOverrides,
    pub lang: Option<String>,
    pub html: Option<PathBuf>,
    pub dry_run: bool,
}

/// Executes the run command with the provided arguments.
///
/// Slot failures do not stop the pipeline: teardown, report generation and
/// analysis always happen, and the failure is returned afterwards.
///
/// 使用提供的参数执行 run 命令。槽位失败不会中断流程：拆除、报告生成和分析总会执行，
/// 之后才返回失败。
pub async fn execute(args: RunArgs) -> Result<()> {
    console::banner();
    let started = Instant::now();

    let (config, locale) = load_config(&args.config, args.overrides, args.lang.as_deref())?;
    config.validate()?;
    sub_step(&t!("loading_config", locale = &locale, path = args.config.display()));

    export_environment(&config, &locale);
    run_pre_commands(&config, &locale).await;

    step(&t!("run.step_schedule", locale = &locale), true);
    let candidates = collect_candidates(&config)?;
    let store = fs::load_duration_store(&store_path(&config));
    let plan = planner::plan_execution(
        &candidates,
        &config.browsers,
        config.parallelism,
        store.as_ref(),
    )?;
    sub_step(&t!(
        "run.candidates_found",
        locale = &locale,
        count = plan.candidate_count,
        history = plan.with_history_count
    ));
    print_schedule(&plan.schedule, store.as_ref(), &locale);

    if let Some(report_path) = &args.html {
        sub_step(&t!("html_report_written", locale = &locale, path = report_path.display()));
        if let Err(e) = generate_html_report(&plan.schedule, store.as_ref(), report_path, &locale) {
            eprintln!("{} {:#}", t!("html_report_failed", locale = &locale).red(), e);
        }
    }

    if plan.schedule.is_empty() {
        println!("{}", t!("no_specs_to_run", locale = &locale).green());
        return Ok(());
    }

    let project = ComposeProject::from_config(&config);
    let prefix = command::container_prefix(&config.cypress_container_name);
    let slots = command::build_slot_commands(&config, &plan.schedule, &prefix)?;

    if args.dry_run {
        step(&t!("run.step_dry_run", locale = &locale), true);
        println!("{}", command::display_command(project.program(), &project.build_args()));
        for slot in &slots {
            println!("{}", slot_command_line(&project, slot));
        }
        return Ok(());
    }

    let stop_token = setup_signal_handler(&locale);

    build_image(&project, &config.environment, &locale).await?;

    step(&t!("run.step_start", locale = &locale), true);
    for slot in &slots {
        sub_step(&format!("~$ {}", slot_command_line(&project, slot)));
    }
    let runner = Arc::new(SlotRunner::compose(
        project.clone(),
        config.environment.clone(),
        config.timeout_secs.map(Duration::from_secs),
    ));
    let results = run_slots(slots, runner, stop_token, &locale).await;

    down_containers(&project, &config.environment, &locale).await;
    if let Some(merged) = generate_reports(&config, &locale).await {
        if config.analyse_report {
            if let Err(e) = analyse_report(&merged, &store_path(&config), &config, &locale) {
                eprintln!("{} {:#}", t!("analyse.failed", locale = &locale).red(), e);
            }
        }
    }

    print_summary(&results, &locale);
    if !console::is_silent() {
        println!(
            "\n[*] {}: {:.2?}",
            t!("run.total_time", locale = &locale),
            started.elapsed()
        );
    }

    let failures: Vec<_> = results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        println!("\n{}", t!("all_slots_passed", locale = &locale).green().bold());
        Ok(())
    } else {
        print_failure_details(&failures, &locale);
        anyhow::bail!(t!("slots_failed", locale = &locale, count = failures.len()).to_string());
    }
}

fn slot_command_line(project: &ComposeProject, slot: &SlotCommand) -> String {
    command::display_command(
        project.program(),
        &project.run_args(&slot.container_name, &slot.script),
    )
}

fn export_environment(config: &OrchestratorConfig, locale: &str) {
    step(&t!("run.step_env", locale = locale), false);
    for (key, value) in &config.environment {
        sub_step(&format!("{}={}", key, value));
    }
}

/// Runs the pre-commands one after another. Their failures are reported but
/// do not stop the run.
async fn run_pre_commands(config: &OrchestratorConfig, locale: &str) {
    step(&t!("run.step_pre_commands", locale = locale), true);
    for line in &config.pre_commands {
        sub_step(&format!("~$ {}", line));
        let (status, output) =
            command::spawn_and_capture(command::shell_command(line, &config.environment)).await;
        if !output.trim().is_empty() {
            sub_step(output.trim_end());
        }
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => eprintln!(
                "{}",
                t!("run.pre_command_failed", locale = locale, command = line, status = status)
                    .yellow()
            ),
            Err(e) => eprintln!(
                "{}",
                t!("run.pre_command_failed", locale = locale, command = line, status = e).yellow()
            ),
        }
    }
}

async fn build_image(
    project: &ComposeProject,
    env: &BTreeMap<String, String>,
    locale: &str,
) -> Result<()> {
    step(&t!("run.step_build", locale = locale), true);
    let args = project.build_args();
    sub_step(&format!("~$ {}", command::display_command(project.program(), &args)));

    let (status, output) = command::spawn_and_capture(command::compose_command(project, &args, env)).await;
    if !output.trim().is_empty() {
        sub_step(output.trim_end());
    }
    let status = status.with_context(|| t!("run.build_failed", locale = locale).to_string())?;
    if !status.success() {
        anyhow::bail!(
            "{}\n{}",
            t!("run.build_failed", locale = locale),
            output
        );
    }
    Ok(())
}

async fn down_containers(project: &ComposeProject, env: &BTreeMap<String, String>, locale: &str) {
    step(&t!("run.step_down", locale = locale), true);
    let args = project.down_args();
    sub_step(&format!("~$ {}", command::display_command(project.program(), &args)));
    let (status, output) = command::spawn_and_capture(command::compose_command(project, &args, env)).await;
    if !matches!(status, Ok(s) if s.success()) {
        eprintln!("{}\n{}", t!("run.down_failed", locale = locale).yellow(), output);
    }
}

/// Merges the per-spec reports and renders the HTML report.
///
/// Returns the merged report path when a report directory is configured.
/// 合并每个 spec 的报告并渲染 HTML 报告。配置了报告目录时返回合并报告的路径。
async fn generate_reports(config: &OrchestratorConfig, locale: &str) -> Option<PathBuf> {
    if config.report_path.is_empty() {
        return None;
    }
    step(&t!("run.step_reports", locale = locale), true);

    let report_dir = Path::new(&config.report_path);
    let merged = report_dir.join("mochawesome.json");
    if let Err(e) = std::fs::create_dir_all(report_dir) {
        eprintln!("{} {}", t!("run.report_failed", locale = locale).yellow(), e);
        return Some(merged);
    }

    let merged_str = merged.display().to_string();
    let templates = [
        command::render_template(
            &config.merge_command,
            &[
                ("input", config.mochawesome_json_path.as_str()),
                ("output", merged_str.as_str()),
            ],
        ),
        command::render_template(
            &config.report_command,
            &[
                ("output", merged_str.as_str()),
                ("report_dir", config.report_path.as_str()),
            ],
        ),
    ];

    for line in templates.iter().filter(|line| !line.trim().is_empty()) {
        sub_step(&format!("~$ {}", line));
        let result = match command::command_from_line(line, &config.environment) {
            Ok(cmd) => command::spawn_and_capture(cmd).await,
            Err(e) => {
                eprintln!("{} {:#}", t!("run.report_failed", locale = locale).yellow(), e);
                continue;
            }
        };
        if !matches!(result.0, Ok(s) if s.success()) {
            eprintln!("{}\n{}", t!("run.report_failed", locale = locale).yellow(), result.1);
        }
    }
    sub_step(&t!(
        "run.html_report",
        locale = locale,
        path = report_dir.join("mochawesome.html").display()
    ));
    Some(merged)
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}
