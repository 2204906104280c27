// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::ConfigOverrides;
use crate::infra::t;
use crate::reporting::console;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--lang")
        .and_then(|pos| args.get(pos + 1).cloned())
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .default_value("orchestrator.toml")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn schedule_args(locale: &str) -> Vec<Arg> {
    vec![
        config_arg(locale),
        Arg::new("parallelism")
            .short('p')
            .long("parallelism")
            .help(t!("arg_parallelism", locale = locale).to_string())
            .value_name("SLOTS")
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set),
        Arg::new("browsers")
            .short('b')
            .long("browsers")
            .help(t!("arg_browsers", locale = locale).to_string())
            .value_name("BROWSERS")
            .value_delimiter(',')
            .action(ArgAction::Set),
        Arg::new("specs")
            .long("specs")
            .help(t!("arg_specs", locale = locale).to_string())
            .value_name("SPECS")
            .value_delimiter(',')
            .action(ArgAction::Set),
        Arg::new("html")
            .long("html")
            .help(t!("arg_html", locale = locale).to_string())
            .value_name("HTML")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
    ]
}

fn build_cli(locale: &str) -> Command {
    Command::new("spec-orchestrator")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("silent")
                .long("silent")
                .help(t!("cli_silent", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .args(schedule_args(locale))
                .arg(
                    Arg::new("timeout-secs")
                        .long("timeout-secs")
                        .help(t!("arg_timeout_secs", locale = locale).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("analyse-report")
                        .long("analyse-report")
                        .help(t!("arg_analyse_report", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("report-path")
                        .long("report-path")
                        .help(t!("arg_report_path", locale = locale).to_string())
                        .value_name("DIR")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help(t!("arg_dry_run", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about(t!("cmd_plan_about", locale = locale).to_string())
                .args(schedule_args(locale))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("analyse")
                .about(t!("cmd_analyse_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(
                    Arg::new("report")
                        .short('r')
                        .long("report")
                        .help(t!("arg_report", locale = locale).to_string())
                        .value_name("REPORT")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("store")
                        .long("store")
                        .help(t!("arg_store", locale = locale).to_string())
                        .value_name("STORE")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_output", locale = locale).to_string())
                        .value_name("OUTPUT")
                        .default_value("orchestrator.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Reads the schedule-shaping overrides shared by `run` and `plan`.
fn overrides_from(matches: &ArgMatches) -> ConfigOverrides {
    let list = |id: &str| {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect::<Vec<_>>())
    };
    ConfigOverrides {
        parallelism: matches.get_one::<usize>("parallelism").copied(),
        browsers: list("browsers"),
        specs: list("specs"),
        ..Default::default()
    }
}

fn config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("orchestrator.toml"))
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_lang = pre_parse_language();
    let language = crate::resolve_locale(explicit_lang.as_deref());
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();
    if matches.get_flag("silent") {
        console::set_silent(true);
    }

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let mut overrides = overrides_from(run_matches);
            overrides.timeout_secs = run_matches.get_one::<u64>("timeout-secs").copied();
            overrides.analyse_report = run_matches.get_flag("analyse-report");
            overrides.report_path = run_matches.get_one::<String>("report-path").cloned();

            commands::run::execute(commands::run::RunArgs {
                config: config_path(run_matches),
                overrides,
                lang: explicit_lang,
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                dry_run: run_matches.get_flag("dry-run"),
            })
            .await?;
        }
        Some(("plan", plan_matches)) => {
            commands::plan::execute(
                config_path(plan_matches),
                overrides_from(plan_matches),
                explicit_lang,
                plan_matches.get_one::<PathBuf>("html").cloned(),
                plan_matches.get_flag("json"),
            )?;
        }
        Some(("analyse", analyse_matches)) => {
            let report = analyse_matches
                .get_one::<PathBuf>("report")
                .cloned()
                .unwrap_or_default();
            commands::analyse::execute(
                config_path(analyse_matches),
                report,
                analyse_matches.get_one::<PathBuf>("store").cloned(),
                explicit_lang,
            )?;
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("orchestrator.toml"));
            let non_interactive = init_matches.get_flag("non-interactive");

            // Show language detection message if it was auto-detected
            if explicit_lang.is_none() && !non_interactive {
                println!(
                    "🌐 {}",
                    t!("system_language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::run_init_wizard(&output, &language, non_interactive)?;
        }
        _ => {
            build_cli(&language).print_help()?;
        }
    }
    Ok(())
}
