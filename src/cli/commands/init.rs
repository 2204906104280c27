//! # Init Command Module / 初始化命令模块
//!
//! An interactive wizard that writes a starter `orchestrator.toml`. With
//! `--non-interactive` the defaults are written without asking anything.
//!
//! 生成初始 `orchestrator.toml` 的交互式向导。使用 `--non-interactive` 时不提问，直接写入默认值。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::core::config::OrchestratorConfig;
use crate::infra::t;

/// Compose files looked for in the current directory, in order.
const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Runs the interactive wizard to generate a configuration file at `output`.
///
/// 运行交互式向导，在 `output` 处生成配置文件。
pub fn run_init_wizard(output: &Path, language: &str, non_interactive: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !non_interactive {
        println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
        println!("{}", t!("init.description", locale = language));
    }

    if output.exists() && !non_interactive {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = output.display()))
            .default(false)
            .interact()
            .context(t!("init.confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let mut config = starter_config(language);

    if let Some(compose_file) = detect_compose_file(Path::new(".")) {
        if !non_interactive {
            println!(
                "{}",
                t!("init.detected_compose", locale = language, path = compose_file.green())
            );
        }
        config.docker_compose_path = compose_file;
    }

    if non_interactive {
        return write_config(output, &config, language);
    }

    config.parallelism = Input::with_theme(&theme)
        .with_prompt(t!("init.parallelism_prompt", locale = language))
        .default(config.parallelism)
        .interact_text()?;

    let known = config.known_browsers.clone();
    let defaults: Vec<bool> = known.iter().map(|b| config.browsers.contains(b)).collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.browsers_prompt", locale = language))
        .items(&known)
        .defaults(&defaults)
        .interact()
        .context(t!("init.confirmation_failed", locale = language).to_string())?;
    if selections.is_empty() {
        println!("{}", t!("init.no_browsers_selected", locale = language).yellow());
    } else {
        config.browsers = selections.into_iter().map(|i| known[i].clone()).collect();
    }

    config.specs_home_path = Input::with_theme(&theme)
        .with_prompt(t!("init.specs_home_prompt", locale = language))
        .default(config.specs_home_path.clone())
        .interact_text()?;
    config.specs_docker_path = Input::with_theme(&theme)
        .with_prompt(t!("init.specs_docker_prompt", locale = language))
        .default(config.specs_docker_path.clone())
        .interact_text()?;
    config.cypress_container_name = Input::with_theme(&theme)
        .with_prompt(t!("init.service_prompt", locale = language))
        .default(config.cypress_container_name.clone())
        .interact_text()?;
    config.analyse_report = Confirm::with_theme(&theme)
        .with_prompt(t!("init.analyse_prompt", locale = language))
        .default(config.analyse_report)
        .interact()
        .context(t!("init.confirmation_failed", locale = language).to_string())?;

    write_config(output, &config, language)
}

/// The configuration written when no question is answered.
fn starter_config(language: &str) -> OrchestratorConfig {
    OrchestratorConfig {
        language: Some(language.to_string()),
        parallelism: 2,
        browsers: vec!["chrome".to_string()],
        docker_compose_path: "docker-compose.yml".to_string(),
        specs_home_path: "cypress/e2e".to_string(),
        specs_docker_path: "/e2e/cypress/e2e".to_string(),
        cypress_container_name: "cypress".to_string(),
        mochawesome_json_path: "cypress/reports/mochawesome/*.json".to_string(),
        report_path: "cypress/reports".to_string(),
        analyse_report: true,
        ..Default::default()
    }
}

/// Finds the compose file of the project in `dir`, if any.
fn detect_compose_file(dir: &Path) -> Option<String> {
    COMPOSE_FILES
        .iter()
        .find(|name| dir.join(name).is_file())
        .map(|name| name.to_string())
}

fn write_config(path: &Path, config: &OrchestratorConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)
        .context(t!("init.serialize_failed", locale = language).to_string())?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                t!("init.write_failed", locale = language, path = path.display()).to_string()
            })?;
        }
    }
    fs::write(path, toml_string).with_context(|| {
        t!("init.write_failed", locale = language, path = path.display()).to_string()
    })?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn non_interactive_init_writes_a_loadable_config() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested/orchestrator.toml");

        run_init_wizard(&output, "en", true).unwrap();

        let config = crate::core::config::load_config(&output).unwrap();
        config.validate().unwrap();
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.browsers, vec!["chrome"]);
        assert!(config.analyse_report);
    }

    #[test]
    fn compose_file_is_detected() {
        let dir = tempdir().unwrap();
        assert_eq!(detect_compose_file(dir.path()), None);
        fs::write(dir.path().join("compose.yaml"), "services: {}").unwrap();
        assert_eq!(detect_compose_file(dir.path()).as_deref(), Some("compose.yaml"));
    }
}
