//! # Slot Execution Module / 槽位执行模块
//!
//! Runs the slot commands of a schedule concurrently and waits for every one of
//! them to settle. A failing slot never cancels the others. A slot whose runner
//! could not attach to Firefox is started once more under a new container name.
//!
//! 并发运行调度计划中的槽位命令，并等待所有槽位结束。失败的槽位不会取消其他槽位。
//! 若某槽位的运行器无法连接到 Firefox，则以新的容器名再启动一次。

use colored::*;
use futures::{StreamExt, stream};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::models::{FailureReason, SlotResult};
use crate::infra::command::{self, ComposeProject, SlotCommand};
use crate::infra::t;
use crate::reporting::console;

/// Output marker of the one transient failure that is retried.
/// 唯一会被重试的瞬时失败的输出标记。
pub const RECONNECT_FAILURE: &str = "cypress failed to make a connection to firefox";

/// Delay before the reconnect retry.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

type Launcher = dyn Fn(&SlotCommand) -> tokio::process::Command + Send + Sync;

/// Starts slot processes and enforces the per-slot time limit.
/// 启动槽位进程并强制执行每个槽位的时限。
pub struct SlotRunner {
    launcher: Box<Launcher>,
    timeout: Option<Duration>,
    retry_delay: Duration,
}

impl SlotRunner {
    /// A runner that starts each slot with the given launcher.
    pub fn new<F>(launcher: F, timeout: Option<Duration>) -> Self
    where
        F: Fn(&SlotCommand) -> tokio::process::Command + Send + Sync + 'static,
    {
        Self {
            launcher: Box::new(launcher),
            timeout,
            retry_delay: RETRY_DELAY,
        }
    }

    /// A runner that starts each slot as a `docker-compose run` container.
    /// 以 `docker-compose run` 容器启动每个槽位的运行器。
    pub fn compose(
        project: ComposeProject,
        env: BTreeMap<String, String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self::new(
            move |slot: &SlotCommand| {
                let args = project.run_args(&slot.container_name, &slot.script);
                command::compose_command(&project, &args, &env)
            },
            timeout,
        )
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Runs one slot, retrying once on the Firefox connection failure.
    ///
    /// 运行单个槽位，遇到 Firefox 连接失败时重试一次。
    pub async fn run_slot(&self, slot: &SlotCommand, locale: &str) -> SlotResult {
        let first = self.run_once(slot, false).await;

        let retry = matches!(
            &first,
            SlotResult::Failed { reason: FailureReason::RunnerFailed, output, .. }
                if needs_reconnect_retry(output)
        );
        if !retry {
            return first;
        }

        let renamed = slot.renamed();
        console::sub_step(
            &t!(
                "run.slot_retrying",
                locale = locale,
                name = slot.name(),
                container = &renamed.container_name
            )
            .yellow()
            .to_string(),
        );
        tokio::time::sleep(self.retry_delay).await;
        self.run_once(&renamed, true).await
    }

    async fn run_once(&self, slot: &SlotCommand, retried: bool) -> SlotResult {
        let start = Instant::now();
        let capture = command::spawn_and_capture((self.launcher)(slot));

        let captured = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, capture).await {
                Ok(captured) => captured,
                Err(_) => {
                    return SlotResult::Failed {
                        slot: slot.name(),
                        output: t!("run.slot_timeout_message", secs = limit.as_secs()).to_string(),
                        reason: FailureReason::Timeout,
                        duration: limit,
                        retried,
                    };
                }
            },
            None => capture.await,
        };

        let duration = start.elapsed();
        match captured {
            (Ok(status), output) if status.success() => SlotResult::Passed {
                slot: slot.name(),
                output,
                duration,
                retried,
            },
            (Ok(_), output) => SlotResult::Failed {
                slot: slot.name(),
                output,
                reason: FailureReason::RunnerFailed,
                duration,
                retried,
            },
            (Err(e), _) => SlotResult::Failed {
                slot: slot.name(),
                output: e.to_string(),
                reason: FailureReason::SpawnFailed,
                duration,
                retried,
            },
        }
    }
}

/// Whether a failed slot's output shows the Firefox connection failure.
pub fn needs_reconnect_retry(output: &str) -> bool {
    output.to_lowercase().contains(RECONNECT_FAILURE)
}

/// Runs all slots concurrently and returns their results in slot order.
///
/// Every slot is awaited regardless of how the others end. When `stop_token`
/// is cancelled the slots still running are aborted and reported as cancelled.
///
/// 并发运行所有槽位并按槽位顺序返回结果。
/// 无论其他槽位如何结束，每个槽位都会被等待。`stop_token` 被取消时，
/// 仍在运行的槽位被中止并报告为已取消。
pub async fn run_slots(
    slots: Vec<SlotCommand>,
    runner: Arc<SlotRunner>,
    stop_token: CancellationToken,
    locale: &str,
) -> Vec<SlotResult> {
    let concurrency = slots.len().max(1);

    stream::iter(slots.into_iter().map(|slot| {
        let runner = Arc::clone(&runner);
        let stop_token = stop_token.clone();
        let locale = locale.to_string();

        async move {
            let name = slot.name();
            let mut handle = tokio::spawn(async move {
                let result = runner.run_slot(&slot, &locale).await;
                print_slot_settled(&result, &locale);
                result
            });

            tokio::select! {
                biased;
                _ = stop_token.cancelled() => {
                    handle.abort();
                    SlotResult::Cancelled { slot: name }
                }
                joined = &mut handle => match joined {
                    Ok(result) => result,
                    Err(e) => SlotResult::Failed {
                        slot: name,
                        output: format!("Critical error during slot execution: {}", e),
                        reason: FailureReason::SpawnFailed,
                        duration: Duration::default(),
                        retried: false,
                    },
                },
            }
        }
    }))
    .buffered(concurrency)
    .collect()
    .await
}

fn print_slot_settled(result: &SlotResult, locale: &str) {
    let status = result.get_status_str(locale);
    let status = if result.is_failure() {
        status.red()
    } else {
        status.green()
    };
    console::sub_step(&format!("{} {}", result.slot_name().cyan(), status));
}
