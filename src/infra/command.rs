//! # Command Module / 命令模块
//!
//! Turns a schedule into the concrete processes that run it: one
//! `docker-compose run` per populated slot, each executing the spec runner for
//! one browser over that slot's specs. Also provides output capture for the
//! spawned processes.
//!
//! 将调度计划转换为实际运行的进程：每个非空槽位一个 `docker-compose run`，
//! 每个进程在一个浏览器上运行该槽位的 spec。同时提供子进程输出捕获。

use anyhow::{Context, Result, anyhow};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::config::OrchestratorConfig;
use crate::core::models::Schedule;

const COMPOSE_PROGRAM: &str = "docker-compose";

/// The compose project the runner containers belong to.
/// 运行容器所属的 compose 项目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    options: Vec<String>,
    compose_file: String,
    service: String,
}

impl ComposeProject {
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let options = config
            .docker_compose_options
            .iter()
            .flat_map(|(option, value)| {
                std::iter::once(option.clone())
                    .chain((!value.is_empty()).then(|| value.clone()))
            })
            .collect();
        Self {
            options,
            compose_file: config.docker_compose_path.clone(),
            service: config.cypress_container_name.clone(),
        }
    }

    pub fn program(&self) -> &'static str {
        COMPOSE_PROGRAM
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = self.options.clone();
        if !self.compose_file.is_empty() {
            args.push("-f".to_string());
            args.push(self.compose_file.clone());
        }
        args
    }

    /// Arguments that build the runner image.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        args.push("build".to_string());
        args.push(self.service.clone());
        args
    }

    /// Arguments that stop and remove the project's containers.
    pub fn down_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        args.push("down".to_string());
        args
    }

    /// Arguments that run `script` in a fresh container named `container_name`.
    pub fn run_args(&self, container_name: &str, script: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.extend([
            "run".to_string(),
            "--name".to_string(),
            container_name.to_string(),
            self.service.clone(),
            "bash".to_string(),
            "-c".to_string(),
            script.to_string(),
        ]);
        args
    }
}

/// One populated slot, ready to be executed.
/// 一个已填充的槽位，准备执行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCommand {
    pub browser: String,
    /// Index of the slot within its browser.
    pub index: usize,
    pub specs: Vec<String>,
    pub container_name: String,
    /// Shell script run inside the container.
    /// 在容器内运行的 shell 脚本。
    pub script: String,
}

impl SlotCommand {
    /// Display name of the slot, e.g. `chrome#1`.
    pub fn name(&self) -> String {
        format!("{}#{}", self.browser, self.index + 1)
    }

    /// The same slot under a new, randomly suffixed container name.
    /// 使用新的随机后缀容器名的同一槽位。
    pub fn renamed(&self) -> Self {
        Self {
            container_name: format!("{}_{}", self.container_name, random_suffix()),
            ..self.clone()
        }
    }
}

fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(0..100_000)
}

/// Prefix for this run's container names: the service name plus a random number.
pub fn container_prefix(service: &str) -> String {
    format!("{}_{}", service, random_suffix())
}

/// Path of a spec inside the runner container, always with `/` separators.
/// spec 在运行容器内的路径，始终使用 `/` 分隔符。
pub fn docker_spec_path(docker_root: &str, spec: &str) -> String {
    let spec = spec.replace('\\', "/");
    let root = docker_root.replace('\\', "/");
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        spec
    } else {
        format!("{}/{}", root, spec.trim_start_matches("./"))
    }
}

/// Builds the runner invocation for one browser over a list of container paths.
///
/// `<runner_command> -b <browser> --spec <path>,<path>,...`, shell-quoted.
pub fn runner_script(runner_command: &str, browser: &str, spec_paths: &[String]) -> Result<String> {
    let mut words = shlex::split(runner_command)
        .ok_or_else(|| anyhow!("Unbalanced quotes in runner command: {}", runner_command))?;
    words.extend([
        "-b".to_string(),
        browser.to_string(),
        "--spec".to_string(),
        spec_paths.join(","),
    ]);
    shlex::try_join(words.iter().map(String::as_str))
        .map_err(|e| anyhow!("Cannot quote runner command: {}", e))
}

/// Creates one command per populated slot, numbering containers across browsers.
///
/// 为每个非空槽位创建一条命令，容器编号跨浏览器连续。
pub fn build_slot_commands(
    config: &OrchestratorConfig,
    schedule: &Schedule,
    prefix: &str,
) -> Result<Vec<SlotCommand>> {
    schedule
        .iter_slots()
        .enumerate()
        .map(|(n, (browser, index, specs))| {
            let paths: Vec<String> = specs
                .iter()
                .map(|spec| docker_spec_path(&config.specs_docker_path, spec))
                .collect();
            Ok(SlotCommand {
                browser: browser.to_string(),
                index,
                specs: specs.to_vec(),
                container_name: format!("{}__{}", prefix, n),
                script: runner_script(&config.runner_command, browser, &paths)?,
            })
        })
        .collect()
}

/// Substitutes `{key}` placeholders in a command template.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

/// Renders a program and its arguments as a copy-pasteable shell line.
pub fn display_command(program: &str, args: &[String]) -> String {
    let words = std::iter::once(program).chain(args.iter().map(String::as_str));
    shlex::try_join(words.clone()).unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
}

/// Creates a process from a shell-like command line, with `env` exported to it.
/// 从类 shell 命令行创建进程，并向其导出 `env`。
pub fn command_from_line(
    line: &str,
    env: &BTreeMap<String, String>,
) -> Result<tokio::process::Command> {
    let words = shlex::split(line).with_context(|| format!("Unbalanced quotes in: {}", line))?;
    let (program, args) = words
        .split_first()
        .with_context(|| "Empty command line".to_string())?;
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args).envs(env);
    Ok(cmd)
}

/// Creates a `sh -c` process for a line that may use shell syntax.
pub fn shell_command(line: &str, env: &BTreeMap<String, String>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(line).envs(env);
    cmd
}

/// Creates a `docker-compose` process for the given arguments.
pub fn compose_command(
    project: &ComposeProject,
    args: &[String],
    env: &BTreeMap<String, String>,
) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(project.program());
    cmd.args(args).envs(env);
    cmd
}

/// Appends every line of `reader` to `output` until the stream ends.
///
/// Lines are decoded lossily, so bytes that are not UTF-8 never stop the
/// reader and the child never blocks on a full pipe.
///
/// 将 `reader` 的每一行追加到 `output`，直到流结束。按有损方式解码，
/// 非 UTF-8 字节不会中断读取，子进程也不会因管道写满而阻塞。
async fn drain_lines<R>(reader: R, output: Arc<tokio::sync::Mutex<String>>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let mut output = output.lock().await;
                output.push_str(&String::from_utf8_lossy(&buf));
                output.push('\n');
            }
        }
    }
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<std::process::ExitStatus>, String) {
    // The child is killed if this future is dropped, e.g. on timeout.
    // 如果此 future 被丢弃（例如超时），子进程会被终止。
    let mut child = match cmd
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other("Failed to capture child output")),
            String::new(),
        );
    };

    let output = Arc::new(tokio::sync::Mutex::new(String::new()));

    let stdout_output = Arc::clone(&output);
    let stdout_handle = tokio::spawn(drain_lines(stdout, stdout_output));

    let stderr_output = Arc::clone(&output);
    let stderr_handle = tokio::spawn(drain_lines(stderr, stderr_output));

    let status = child.wait().await;

    // Wait for the readers so no trailing output is lost.
    // 等待读取任务结束，避免丢失末尾输出。
    if let Err(e) = stdout_handle.await {
        eprintln!("Failed to join stdout task: {}", e);
    }
    if let Err(e) = stderr_handle.await {
        eprintln!("Failed to join stderr task: {}", e);
    }

    let captured = output.lock().await.clone();
    (status, captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::BrowserSchedule;

    fn config() -> OrchestratorConfig {
        let mut config = OrchestratorConfig {
            docker_compose_path: "docker/compose.yml".into(),
            cypress_container_name: "cypress".into(),
            specs_docker_path: "/e2e/specs/".into(),
            ..Default::default()
        };
        config
            .docker_compose_options
            .insert("-p".into(), "suite".into());
        config
    }

    #[test]
    fn docker_paths_are_joined_with_forward_slashes() {
        assert_eq!(docker_spec_path("/e2e/", "auth\\login.js"), "/e2e/auth/login.js");
        assert_eq!(docker_spec_path("", "a.js"), "a.js");
        assert_eq!(docker_spec_path("/e2e", "./a.js"), "/e2e/a.js");
    }

    #[test]
    fn runner_script_lists_specs_comma_separated() {
        let script = runner_script(
            "npx cypress run --headless",
            "firefox",
            &["/e2e/a.js".into(), "/e2e/b.js".into()],
        )
        .unwrap();
        assert_eq!(
            shlex::split(&script).unwrap(),
            vec![
                "npx", "cypress", "run", "--headless", "-b", "firefox", "--spec",
                "/e2e/a.js,/e2e/b.js"
            ]
        );
    }

    #[test]
    fn compose_arguments_carry_options_and_file() {
        let project = ComposeProject::from_config(&config());
        assert_eq!(
            project.build_args(),
            vec!["-p", "suite", "-f", "docker/compose.yml", "build", "cypress"]
        );
        assert_eq!(
            project.run_args("c__0", "echo hi"),
            vec![
                "-p", "suite", "-f", "docker/compose.yml", "run", "--name", "c__0", "cypress",
                "bash", "-c", "echo hi"
            ]
        );
    }

    #[test]
    fn slot_commands_are_numbered_across_browsers() {
        let schedule = Schedule {
            browsers: vec![
                BrowserSchedule {
                    browser: "chrome".into(),
                    slots: vec![vec!["a.js".into()], vec!["b.js".into()]],
                },
                BrowserSchedule {
                    browser: "firefox".into(),
                    slots: vec![vec!["a.js".into(), "b.js".into()]],
                },
            ],
        };
        let commands = build_slot_commands(&config(), &schedule, "cypress_42").unwrap();
        let names: Vec<_> = commands.iter().map(|c| c.container_name.as_str()).collect();
        assert_eq!(names, vec!["cypress_42__0", "cypress_42__1", "cypress_42__2"]);
        assert_eq!(commands[2].name(), "firefox#1");
        let words = shlex::split(&commands[2].script).unwrap();
        assert_eq!(words.last().unwrap(), "/e2e/specs/a.js,/e2e/specs/b.js");
    }

    #[test]
    fn renamed_slot_keeps_the_old_name_as_prefix() {
        let slot = SlotCommand {
            browser: "firefox".into(),
            index: 0,
            specs: vec![],
            container_name: "cypress_1__3".into(),
            script: String::new(),
        };
        let renamed = slot.renamed();
        assert!(renamed.container_name.starts_with("cypress_1__3_"));
        assert_ne!(renamed.container_name, slot.container_name);
    }

    #[test]
    fn templates_substitute_every_placeholder() {
        assert_eq!(
            render_template("merge {input} -o {output} {output}", &[("input", "a/*.json"), ("output", "m.json")]),
            "merge a/*.json -o m.json m.json"
        );
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c").arg("echo out; echo err 1>&2; exit 3");
        let (status, output) = spawn_and_capture(cmd).await;
        assert_eq!(status.unwrap().code(), Some(3));
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[tokio::test]
    async fn output_after_invalid_utf8_is_still_captured() {
        // Enough trailing output to fill the pipe if the reader stopped early.
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c").arg(
            "printf 'a\\377b\\n'; head -c 300000 /dev/zero | tr '\\0' x; echo; \
             echo 'cypress failed to make a connection to firefox'",
        );
        let (status, output) = spawn_and_capture(cmd).await;
        assert!(status.unwrap().success());
        assert!(output.starts_with("a\u{FFFD}b\n"));
        assert!(output.contains("cypress failed to make a connection to firefox"));
        assert!(output.len() > 300_000);
    }
}
