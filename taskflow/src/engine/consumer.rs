// Consumer - 並列ワーカー機能

use crate::{
    core::{ProgressReporter, Task, TaskError, TaskHandler, TaskResult},
    sync::{BarrierGuard, CancellationToken, CountingBarrier, TaskQueue},
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// ワーカー群で共有する集計カウンタ
#[derive(Debug, Default)]
pub struct WorkerStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    busy_time_ms: AtomicU64,
}

impl WorkerStats {
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// 全ワーカーがハンドラ内で費やした時間の合計
    pub fn busy_time_ms(&self) -> u64 {
        self.busy_time_ms.load(Ordering::Relaxed)
    }

    fn record(&self, success: bool, started: Instant) {
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.busy_time_ms
            .fetch_add(started.elapsed().as_millis() as u64, Ordering::Relaxed);
    }
}

/// ワーカーが共有する依存関係
pub struct ConsumerContext<T, R, H> {
    pub input: TaskQueue<T>,
    pub output: TaskQueue<TaskResult<R>>,
    pub handler: Arc<H>,
    pub reporter: Arc<dyn ProgressReporter>,
    pub cancellation: Option<CancellationToken>,
    pub stats: Arc<WorkerStats>,
}

impl<T, R, H> Clone for ConsumerContext<T, R, H> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
            handler: Arc::clone(&self.handler),
            reporter: Arc::clone(&self.reporter),
            cancellation: self.cancellation.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

/// 次のタスクを取得。キャンセル済みなら新しいタスクは取り出さない
async fn next_task<T>(
    input: &TaskQueue<T>,
    cancellation: Option<&CancellationToken>,
) -> Option<Task<T>> {
    let popped = match cancellation {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                popped = input.pop_indexed() => popped,
            }
        }
        None => input.pop_indexed().await,
    };
    popped.map(|(seq, payload)| Task::new(seq, payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 単一Consumerワーカー
///
/// 入力が枯渇するかキャンセルされるまでタスクを処理し、結果を出力キューへ送る。
/// `exit_guard` はワーカー終了時（panic含む）にdropされる。
pub fn spawn_single_consumer<T, R, H>(
    worker_id: usize,
    context: ConsumerContext<T, R, H>,
    exit_guard: BarrierGuard,
) -> JoinHandle<()>
where
    T: Send + 'static,
    R: Send + 'static,
    H: TaskHandler<T, R> + 'static,
{
    tokio::spawn(async move {
        let _exit_guard = exit_guard;
        debug!(worker_id, "worker started");

        while let Some(task) = next_task(&context.input, context.cancellation.as_ref()).await {
            let seq = task.seq;
            let started = Instant::now();

            // ハンドラの失敗とpanicはこのタスクの結果に閉じ込める
            let outcome = match AssertUnwindSafe(context.handler.handle(task.payload))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(worker_id, seq, %message, "handler panicked");
                    Err(TaskError::new(format!("handler panicked: {message}")))
                }
            };
            context.stats.record(outcome.is_ok(), started);

            match &outcome {
                Ok(_) => context.reporter.report_task_completed(seq, worker_id).await,
                Err(error) => {
                    context
                        .reporter
                        .report_task_failed(seq, worker_id, &error.message)
                        .await
                }
            }

            let result = TaskResult {
                seq,
                worker_id,
                outcome,
            };
            if context.output.push(result).await.is_err() {
                // 結果キューが外部でクローズされた場合は終了
                warn!(worker_id, seq, "result queue closed, dropping result");
                break;
            }
        }

        debug!(worker_id, "worker exited");
    })
}

/// Consumers: 並列ワーカープール
///
/// 最後に終了したワーカーが `on_last_exit` を実行する。
pub fn spawn_consumers<T, R, H, F>(
    worker_count: usize,
    context: ConsumerContext<T, R, H>,
    exit_barrier: &CountingBarrier,
    on_last_exit: F,
) -> Vec<JoinHandle<()>>
where
    T: Send + 'static,
    R: Send + 'static,
    H: TaskHandler<T, R> + 'static,
    F: Fn() + Clone + Send + 'static,
{
    exit_barrier.add(worker_count);

    (0..worker_count)
        .map(|worker_id| {
            let guard = exit_barrier.guard().on_zero(on_last_exit.clone());
            spawn_single_consumer(worker_id, context.clone(), guard)
        })
        .collect()
}
