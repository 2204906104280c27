// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use spec_orchestrator::config::BrowserSet;
use spec_orchestrator::models::{DurationStore, MergedReport};

/// Creates a project directory with a `specs/` tree and an empty history directory.
///
/// ```text
/// specs/
///   auth/login.spec.js      (@smoke)
///   auth/logout.spec.js
///   cart/checkout.spec.js   (@slow)
///   search.spec.ts
///   helpers.rs              (not a spec)
/// ```
pub fn setup_project() -> TempDir {
    let dir = tempdir().expect("Failed to create temporary directory");
    let specs = dir.path().join("specs");
    fs::create_dir_all(specs.join("auth")).unwrap();
    fs::create_dir_all(specs.join("cart")).unwrap();
    fs::write(specs.join("auth/login.spec.js"), "describe('login @smoke', () => {});").unwrap();
    fs::write(specs.join("auth/logout.spec.js"), "describe('logout', () => {});").unwrap();
    fs::write(specs.join("cart/checkout.spec.js"), "describe('checkout @slow', () => {});").unwrap();
    fs::write(specs.join("search.spec.ts"), "describe('search', () => {});").unwrap();
    fs::write(specs.join("helpers.rs"), "").unwrap();
    fs::create_dir_all(dir.path().join("history")).unwrap();
    dir
}

/// Writes an `orchestrator.toml` pointing at the project's `specs/` and `history/`.
pub fn write_config(project: &TempDir, extra: &str) -> PathBuf {
    let root = project.path().display().to_string();
    let content = format!(
        r#"
language = "en"
parallelism = 2
browsers = ["chrome", "firefox"]
specsHomePath = "{root}/specs"
specsDockerPath = "/e2e/specs"
cypressContainerName = "cypress"
specsExecutionTimePath = "{root}/history/specsExecutionTime.json"
{extra}
"#
    );
    let path = project.path().join("orchestrator.toml");
    fs::write(&path, content).unwrap();
    path
}

pub fn store_path(project: &TempDir) -> PathBuf {
    project.path().join("history/specsExecutionTime.json")
}

/// Writes a duration store given `(spec, chrome ms, firefox ms)` rows, in order.
pub fn write_store(path: &Path, rows: &[(&str, u64, u64)]) {
    let set = BrowserSet::default();
    let mut store = DurationStore::new();
    for (spec, chrome, firefox) in rows {
        let record = store.ensure_record(spec, &set);
        record.add("chrome", *chrome);
        record.add("firefox", *firefox);
    }
    fs::write(path, serde_json::to_string_pretty(&store).unwrap()).unwrap();
}

/// Builds a merged report from `(file, suite title, duration)` triples.
pub fn report(entries: &[(&str, &str, serde_json::Value)]) -> MergedReport {
    let results: Vec<serde_json::Value> = entries
        .iter()
        .map(|(file, title, duration)| {
            serde_json::json!({
                "file": file,
                "suites": [{ "title": title, "duration": duration, "suites": [] }]
            })
        })
        .collect();
    serde_json::from_value(serde_json::json!({ "results": results })).unwrap()
}

/// `["spec0.js", "spec1.js", ...]`
pub fn spec_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("spec{}.js", i)).collect()
}
