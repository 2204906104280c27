//! # Configuration Module / 配置模块
//!
//! Loads the orchestrator configuration from a TOML file (or a JSON file, for
//! setups that still carry an `orchestrator.json`), applies command-line
//! overrides on top of it and validates the result.
//!
//! 从 TOML 文件（或仍使用 `orchestrator.json` 的项目中的 JSON 文件）加载编排器配置，
//! 在其上应用命令行覆盖并校验结果。

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::error::SchedulingError;
use crate::infra::t;

/// The browsers suite titles are matched against, plus the fallback browser.
/// 用于匹配套件标题的浏览器集合，以及回退浏览器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSet {
    known: Vec<String>,
    default: String,
}

impl BrowserSet {
    /// Builds a browser set; names are lowercased.
    pub fn new(known: Vec<String>, default: String) -> Self {
        Self {
            known: known.into_iter().map(|b| b.to_lowercase()).collect(),
            default: default.to_lowercase(),
        }
    }

    pub fn known(&self) -> &[String] {
        &self.known
    }

    pub fn default_browser(&self) -> &str {
        &self.default
    }

    /// Attributes a suite title to a browser.
    ///
    /// A title counts only when it is exactly a known browser name, ignoring case.
    /// Any other title falls back to the default browser.
    ///
    /// 将套件标题归属到某个浏览器。仅当标题（忽略大小写）恰好等于已知浏览器名时才匹配，
    /// 否则回退到默认浏览器。
    pub fn match_title(&self, title: &str) -> &str {
        let lowered = title.to_lowercase();
        self.known
            .iter()
            .find(|browser| **browser == lowered)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

impl Default for BrowserSet {
    fn default() -> Self {
        Self::new(default_known_browsers(), default_browser())
    }
}

/// The complete orchestrator configuration.
/// 完整的编排器配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Language for console messages (e.g. "en", "zh-CN"); the system locale when unset.
    /// 控制台消息的语言（例如 "en"、"zh-CN"）；未设置时使用系统区域设置。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Number of slots per browser.
    /// 每个浏览器的槽位数量。
    #[serde(alias = "parallelizm")]
    pub parallelism: usize,
    /// Optional wall-clock limit for each slot, in seconds.
    /// 每个槽位的可选时限（秒）。
    pub timeout_secs: Option<u64>,
    /// Browsers to run the specs in.
    /// 要运行 spec 的浏览器。
    pub browsers: Vec<String>,
    /// Browser names recognised in suite titles.
    pub known_browsers: Vec<String>,
    /// Browser that suites without a browser title are attributed to.
    pub default_browser: String,
    /// Environment variables exported to every child process.
    /// 导出给每个子进程的环境变量。
    pub environment: BTreeMap<String, String>,
    /// Shell commands run once before the slots start.
    pub pre_commands: Vec<String>,
    /// Extra `docker-compose` options, rendered as `<option> <value>` pairs.
    pub docker_compose_options: BTreeMap<String, String>,
    pub docker_compose_path: String,
    /// Directory the specs are discovered in when `specs` is empty.
    /// 当 `specs` 为空时用于发现 spec 的目录。
    pub specs_home_path: String,
    /// Directory the specs live in inside the runner container.
    /// 运行容器内 spec 所在的目录。
    pub specs_docker_path: String,
    /// File name suffixes that mark a spec during discovery.
    pub spec_extensions: Vec<String>,
    /// Keep only specs whose contents mention at least one of these tags.
    pub include_tags: Vec<String>,
    /// Drop specs whose contents mention any of these tags.
    pub exclude_tags: Vec<String>,
    /// Compose service that runs the specs; also the container name prefix.
    pub cypress_container_name: String,
    /// Command that runs specs inside the container.
    pub runner_command: String,
    /// Glob of the per-spec mochawesome JSON files to merge.
    #[serde(alias = "mochawesomeJSONPath")]
    pub mochawesome_json_path: String,
    /// Directory the merged report is written to.
    pub report_path: String,
    /// Template for merging reports; `{input}` and `{output}` are substituted.
    pub merge_command: String,
    /// Template for rendering the HTML report; `{output}` and `{report_dir}` are substituted.
    pub report_command: String,
    /// Explicit spec list; discovery is skipped when non-empty.
    /// 显式的 spec 列表；非空时跳过自动发现。
    pub specs: Vec<String>,
    /// Refresh the duration store from the merged report after the run.
    /// 运行结束后根据合并报告刷新时长存储。
    pub analyse_report: bool,
    /// Location of the duration store.
    /// 时长存储的位置。
    pub specs_execution_time_path: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            language: None,
            parallelism: 1,
            timeout_secs: None,
            browsers: Vec::new(),
            known_browsers: default_known_browsers(),
            default_browser: default_browser(),
            environment: BTreeMap::new(),
            pre_commands: Vec::new(),
            docker_compose_options: BTreeMap::new(),
            docker_compose_path: String::new(),
            specs_home_path: String::new(),
            specs_docker_path: String::new(),
            spec_extensions: vec![".js".to_string(), ".ts".to_string()],
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            cypress_container_name: String::new(),
            runner_command: "npx cypress run --headless".to_string(),
            mochawesome_json_path: String::new(),
            report_path: String::new(),
            merge_command: "npx mochawesome-merge {input} -o {output}".to_string(),
            report_command: "npx marge {output} --reportDir {report_dir} --charts".to_string(),
            specs: Vec::new(),
            analyse_report: false,
            specs_execution_time_path: "executionTimeReport/specsExecutionTime.json".to_string(),
        }
    }
}

fn default_known_browsers() -> Vec<String> {
    vec!["chrome".to_string(), "firefox".to_string()]
}

fn default_browser() -> String {
    "chrome".to_string()
}

/// Values given on the command line that take precedence over the file.
/// 命令行中给出的值，优先于配置文件。
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub parallelism: Option<usize>,
    pub browsers: Option<Vec<String>>,
    pub specs: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub analyse_report: bool,
    pub report_path: Option<String>,
}

impl OrchestratorConfig {
    /// Parses a configuration from its file contents; `is_json` selects the format.
    pub fn parse(content: &str, is_json: bool) -> Result<Self> {
        if is_json {
            serde_json::from_str(content).context("invalid JSON configuration")
        } else {
            toml::from_str(content).context("invalid TOML configuration")
        }
    }

    /// Applies command-line overrides.
    /// 应用命令行覆盖。
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(parallelism) = overrides.parallelism {
            self.parallelism = parallelism;
        }
        if let Some(browsers) = overrides.browsers {
            self.browsers = browsers;
        }
        // Durations are recorded under lowercase names.
        // 时长以小写浏览器名记录。
        for browser in &mut self.browsers {
            *browser = browser.to_lowercase();
        }
        if let Some(specs) = overrides.specs {
            self.specs = specs;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = Some(timeout);
        }
        if overrides.analyse_report {
            self.analyse_report = true;
        }
        if let Some(report_path) = overrides.report_path {
            self.report_path = report_path;
        }
    }

    /// Expands `~` and environment variables in the path-valued settings.
    /// Values that cannot be expanded are left as written.
    pub fn expand_paths(&mut self) {
        for path in [
            &mut self.docker_compose_path,
            &mut self.specs_home_path,
            &mut self.mochawesome_json_path,
            &mut self.report_path,
            &mut self.specs_execution_time_path,
        ] {
            if let Ok(expanded) = shellexpand::full(path.as_str()) {
                *path = expanded.into_owned();
            }
        }
    }

    /// Checks the settings the scheduler cannot work without.
    /// 检查调度器必需的设置。
    pub fn validate(&self) -> Result<()> {
        if self.parallelism < 1 {
            return Err(SchedulingError::InvalidSlotCount {
                slots: self.parallelism,
            })
            .context(t!("config.invalid_parallelism").to_string());
        }
        if self.browsers.is_empty() {
            bail!("{}", t!("config.no_browsers"));
        }
        let set = self.browser_set();
        if let Some(unknown) = self
            .browsers
            .iter()
            .find(|browser| !set.known().iter().any(|b| b.eq_ignore_ascii_case(browser)))
        {
            bail!("{}", t!("config.unknown_browser", browser = unknown));
        }
        if !set.known().iter().any(|b| b == set.default_browser()) {
            bail!(
                "{}",
                t!(
                    "config.unknown_default_browser",
                    browser = set.default_browser()
                )
            );
        }
        Ok(())
    }

    pub fn browser_set(&self) -> BrowserSet {
        BrowserSet::new(self.known_browsers.clone(), self.default_browser.clone())
    }
}

/// Loads and parses the configuration file at `path`.
/// Files ending in `.json` are parsed as JSON, everything else as TOML.
///
/// 加载并解析 `path` 处的配置文件。以 `.json` 结尾的文件按 JSON 解析，其余按 TOML 解析。
pub fn load_config(path: &Path) -> Result<OrchestratorConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| t!("config.read_failed", path = path.display()).to_string())?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    OrchestratorConfig::parse(&content, is_json)
        .with_context(|| t!("config.parse_failed", path = path.display()).to_string())
}
