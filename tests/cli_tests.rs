mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;

fn orchestrator() -> Command {
    let mut cmd = Command::cargo_bin("spec-orchestrator").unwrap();
    cmd.env_remove("SILENT").arg("--lang").arg("en");
    cmd
}

fn chrome_slots(output: &[u8]) -> Value {
    let schedule: Value = serde_json::from_slice(output).expect("plan --json prints JSON");
    schedule["browsers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["browser"] == "chrome")
        .map(|b| b["slots"].clone())
        .unwrap()
}

/// Without history the discovered specs are dealt in discovery order.
///
/// 没有历史时，发现的 spec 按发现顺序分配。
#[test]
fn test_plan_json_without_history() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");

    let output = orchestrator()
        .arg("plan")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    assert_eq!(
        chrome_slots(&output.stdout),
        serde_json::json!([
            ["auth/login.spec.js", "search.spec.ts"],
            ["auth/logout.spec.js", "cart/checkout.spec.js"]
        ])
    );
}

/// Recorded durations put the slowest specs first before dealing.
///
/// 历史时长会在分配前将最慢的 spec 排在最前。
#[test]
fn test_plan_json_uses_history() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");
    common::write_store(
        &common::store_path(&project),
        &[
            ("login.spec.js", 1_000, 0),
            ("checkout.spec.js", 90_000, 0),
            ("search.spec.ts", 30_000, 0),
        ],
    );

    let output = orchestrator()
        .args(["plan", "--json", "-p", "3", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    // checkout, search, login, then logout without history.
    assert_eq!(
        chrome_slots(&output.stdout),
        serde_json::json!([
            ["cart/checkout.spec.js", "auth/logout.spec.js"],
            ["search.spec.ts"],
            ["auth/login.spec.js"]
        ])
    );
}

#[test]
fn test_plan_respects_explicit_specs_and_browsers() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");

    let output = orchestrator()
        .args(["plan", "--json", "--browsers", "chrome", "--specs", "x.js,y.js", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let schedule: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schedule["browsers"].as_array().unwrap().len(), 1);
    assert_eq!(chrome_slots(&output.stdout), serde_json::json!([["x.js"], ["y.js"]]));
}

#[test]
fn test_zero_parallelism_fails() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");

    orchestrator()
        .args(["plan", "-p", "0", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parallelism must be at least 1"));
}

#[test]
fn test_missing_config_fails() {
    let project = common::setup_project();

    orchestrator()
        .arg("plan")
        .arg("--config")
        .arg(project.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

/// `analyse` turns a merged report into the duration store and summaries.
///
/// `analyse` 将合并报告转换为时长存储和摘要。
#[test]
fn test_analyse_writes_store_and_summaries() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");
    let report = project.path().join("mochawesome.json");
    fs::write(
        &report,
        r#"{"results": [
            {"file": "cypress/e2e/auth/login.spec.js", "suites": [
                {"title": "Chrome", "duration": "4000", "suites": [{"title": "nested", "duration": 1000}]}
            ]},
            {"file": "cypress/e2e/search.spec.ts", "suites": [{"title": "firefox", "duration": 2500}]}
        ]}"#,
    )
    .unwrap();

    orchestrator()
        .args(["analyse", "--config"])
        .arg(&config)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("login.spec.js"));

    let store: Value =
        serde_json::from_str(&fs::read_to_string(common::store_path(&project)).unwrap()).unwrap();
    assert_eq!(store[0]["specName"], "login.spec.js");
    assert_eq!(store[0]["data"][0], serde_json::json!({"browser": "chrome", "duration": 5000}));
    assert_eq!(store[1]["specName"], "search.spec.ts");

    let chrome = fs::read_to_string(project.path().join("history/specsExecutionTime-chrome.json")).unwrap();
    assert!(chrome.contains("00:05"));
    assert!(project.path().join("history/specsExecutionTime-firefox.json").is_file());
}

#[test]
fn test_analyse_missing_report_fails() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");

    orchestrator()
        .args(["analyse", "--config"])
        .arg(&config)
        .arg("--report")
        .arg(project.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No merged report found"));
}

/// A dry run prints the compose commands without starting anything.
///
/// 演练模式打印 compose 命令而不启动任何内容。
#[test]
fn test_run_dry_run_prints_slot_commands() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");

    orchestrator()
        .args(["run", "--dry-run", "--browsers", "chrome", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-compose build cypress"))
        .stdout(predicate::str::contains("--name cypress_"))
        .stdout(predicate::str::contains("-b chrome"))
        .stdout(predicate::str::contains("/e2e/specs/auth/login.spec.js"))
        .stdout(predicate::str::contains("/e2e/specs/cart/checkout.spec.js"));
}

#[test]
fn test_plan_html_report() {
    let project = common::setup_project();
    let config = common::write_config(&project, "");
    let page = project.path().join("out/schedule.html");

    orchestrator()
        .args(["--silent", "plan", "--config"])
        .arg(&config)
        .arg("--html")
        .arg(&page)
        .assert()
        .success();

    let html = fs::read_to_string(&page).unwrap();
    assert!(html.contains("auth/logout.spec.js"));
    assert!(html.contains("firefox"));
}

#[test]
fn test_init_non_interactive_creates_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("orchestrator.toml");

    orchestrator()
        .current_dir(dir.path())
        .args(["init", "--non-interactive", "--output"])
        .arg(&output)
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("parallelism = 2"));
    assert!(content.contains("specsHomePath"));
}
