use crate::control::{with_deadline_cancellable, RateLimiter};
use crate::core::OrchestrationConfig;
use crate::sync::CancellationToken;
use anyhow::Result;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::time::sleep;

/// 固定間隔でタスクを実行し、実行時刻を返す
pub async fn execute_rate_limit(
    config: &impl OrchestrationConfig,
    tasks: usize,
    per_second: Option<u32>,
) -> Result<Vec<DateTime<Local>>> {
    let limiter = match per_second {
        Some(rate) => RateLimiter::per_second(rate)?,
        None => RateLimiter::new(config.rate_interval()),
    };

    println!(
        "🚀 Starting rate-limited task execution (every {:?})...",
        limiter.interval()
    );
    let mut executed_at = Vec::with_capacity(tasks);
    for task in 1..=tasks {
        limiter.wait().await;
        let now = Local::now();
        println!("✅ Task {task} executed at {}", now.format("%H:%M:%S%.3f"));
        executed_at.push(now);
    }

    println!("\n🏁 All tasks executed at a controlled rate.");
    Ok(executed_at)
}

/// キャンセル観測の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Completed { steps: u32 },
    Cancelled { after_steps: u32 },
}

/// トークンをステップごとにポーリングする長時間タスク
async fn long_running_task(token: CancellationToken, steps: u32, step: Duration) -> CancelOutcome {
    for current in 1..=steps {
        if token.is_cancelled() {
            println!("🛑 Task was canceled!");
            return CancelOutcome::Cancelled {
                after_steps: current - 1,
            };
        }
        println!("🔄 Task processing step {current}");
        sleep(step).await;
    }
    println!("✅ Task completed successfully");
    CancelOutcome::Completed { steps }
}

/// 長時間タスクを起動し、一定時間後にキャンセルする
pub async fn execute_cancel(
    steps: u32,
    step: Duration,
    cancel_after: Duration,
) -> Result<CancelOutcome> {
    let token = CancellationToken::new();
    println!("🚀 Starting cancellable task...");
    let task = tokio::spawn(long_running_task(token.child_token(), steps, step));

    sleep(cancel_after).await;
    println!("🛑 Canceling the task...");
    token.cancel();

    let outcome = task.await?;
    println!("\n🏁 Program finished.");
    Ok(outcome)
}

/// 遅いタスクをデッドラインと競合させる
///
/// 期限切れの場合 `Ok(None)`。タスクはキャンセルトークンで停止させる。
pub async fn execute_timeout(task_duration: Duration, deadline: Duration) -> Result<Option<String>> {
    println!("🚀 Starting task with timeout {deadline:?}...");
    let token = CancellationToken::new();
    let outcome = with_deadline_cancellable(deadline, &token, |child| async move {
        child.run_until_cancelled(sleep(task_duration)).await.ok()?;
        Some(format!("✅ Task 1 completed in {task_duration:?}"))
    })
    .await;

    let message = match outcome {
        Ok(message) => message,
        Err(error) if error.is_timeout() => {
            println!("⏳ Timeout! Task took too long and was canceled.");
            None
        }
        Err(error) => return Err(error.into()),
    };
    if let Some(message) = &message {
        println!("{message}");
    }

    println!("\n🏁 Program finished.");
    Ok(message)
}
