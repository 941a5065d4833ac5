// DeadlineGuard - 処理とタイマーの競合
// タイマーが先に切れた場合も処理は強制終了されない（デタッチされる）

use crate::{
    core::{OrchestrationConfig, ToolkitError, ToolkitResult},
    sync::CancellationToken,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// `future` を `budget` 内に完了させる
///
/// 期限切れなら `ToolkitError::TimedOut` を返す。`future` は別タスクとして
/// 走り続け、その結果は破棄される。キャンセルを観測しない処理はリークする。
pub async fn with_deadline<F>(budget: Duration, future: F) -> ToolkitResult<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(future);
    match timeout(budget, handle).await {
        Ok(joined) => joined.map_err(ToolkitError::worker_panicked),
        Err(_) => {
            warn!(budget_ms = budget.as_millis() as u64, "deadline elapsed, task detached");
            Err(ToolkitError::timed_out(budget))
        }
    }
}

/// キャンセルトークンと組み合わせたデッドライン
///
/// `make_future` には `token` の子トークンが渡される。期限切れ時は子トークンを
/// キャンセルするので、トークンをポーリングする処理は自ら終了できる。
/// 親トークンが先にキャンセルされた場合は `ToolkitError::Cancelled`。
pub async fn with_deadline_cancellable<F, Fut>(
    budget: Duration,
    token: &CancellationToken,
    make_future: F,
) -> ToolkitResult<Fut::Output>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let child = token.child_token();
    let handle = tokio::spawn(make_future(child.clone()));

    // 親のキャンセルは子にも伝播し、協調的な処理も同時に終わるため先に判定する
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ToolkitError::Cancelled),
        joined = timeout(budget, handle) => match joined {
            Ok(joined) => joined.map_err(ToolkitError::worker_panicked),
            Err(_) => {
                warn!(
                    budget_ms = budget.as_millis() as u64,
                    "deadline elapsed, cancelling task"
                );
                child.cancel();
                Err(ToolkitError::timed_out(budget))
            }
        },
    }
}

/// 予算を保持する再利用可能なデッドラインガード
#[derive(Debug, Clone, Copy)]
pub struct DeadlineGuard {
    budget: Duration,
}

impl DeadlineGuard {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn from_config<C: OrchestrationConfig + ?Sized>(config: &C) -> Self {
        Self::new(config.deadline())
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub async fn run<F>(&self, future: F) -> ToolkitResult<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        with_deadline(self.budget, future).await
    }

    pub async fn run_cancellable<F, Fut>(
        &self,
        token: &CancellationToken,
        make_future: F,
    ) -> ToolkitResult<Fut::Output>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        with_deadline_cancellable(self.budget, token, make_future).await
    }
}
