// WorkerPool - 固定数ワーカーによるFan-Out処理
// 入力キューを複数ワーカーで消費し、タスクごとに1つの結果を出力キューへ送る

use super::consumer::{spawn_consumers, ConsumerContext, WorkerStats};
use crate::{
    core::{
        OrchestrationConfig, PoolState, ProgressReporter, QueueError, RunSummary, SizingPolicy,
        TaskHandler, TaskResult, ToolkitError, ToolkitResult,
    },
    services::monitoring::NoOpProgressReporter,
    sync::{CancellationToken, CountingBarrier, TaskQueue},
};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// ワーカープールのビルダー
pub struct WorkerPoolBuilder {
    workers: Option<usize>,
    sizing: Option<(Box<dyn SizingPolicy>, usize)>,
    input_capacity: usize,
    output_capacity: usize,
    cancellation: Option<CancellationToken>,
    reporter: Arc<dyn ProgressReporter>,
}

impl Default for WorkerPoolBuilder {
    fn default() -> Self {
        Self {
            workers: None,
            sizing: None,
            input_capacity: DEFAULT_QUEUE_CAPACITY,
            output_capacity: DEFAULT_QUEUE_CAPACITY,
            cancellation: None,
            reporter: Arc::new(NoOpProgressReporter::new()),
        }
    }
}

impl WorkerPoolBuilder {
    /// 設定からワーカー数とキュー容量を取り込む
    pub fn from_config<C: OrchestrationConfig + ?Sized>(config: &C) -> Self {
        Self::default()
            .workers(config.worker_count())
            .input_capacity(config.queue_capacity())
            .output_capacity(config.queue_capacity())
    }

    /// ワーカー数を固定する
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// 負荷シグナルからワーカー数を決める（`workers` より優先）
    pub fn sizing(mut self, policy: impl SizingPolicy + 'static, load: usize) -> Self {
        self.sizing = Some((Box::new(policy), load));
        self
    }

    pub fn input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    pub fn output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// キャンセル時、ワーカーは新しいタスクを取り出さずに終了する
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    fn resolve_worker_count(&self) -> ToolkitResult<usize> {
        let workers = match (&self.sizing, self.workers) {
            (Some((policy, load)), _) => policy.worker_count(*load),
            (None, Some(workers)) => workers,
            (None, None) => num_cpus::get().max(1),
        };

        if workers == 0 {
            return Err(ToolkitError::configuration(
                "workers",
                "a pool needs at least one worker",
            ));
        }
        Ok(workers)
    }

    /// 専用の入力キューを作成してプールを起動する
    pub async fn start<T, R, H>(self, handler: H) -> ToolkitResult<WorkerPool<T, R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        H: TaskHandler<T, R> + 'static,
    {
        let input = TaskQueue::new(self.input_capacity);
        self.start_with_input(input, handler).await
    }

    /// 既存のキュー（Batcherの出力など）を入力としてプールを起動する
    pub async fn start_with_input<T, R, H>(
        self,
        input: TaskQueue<T>,
        handler: H,
    ) -> ToolkitResult<WorkerPool<T, R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        H: TaskHandler<T, R> + 'static,
    {
        let workers = self.resolve_worker_count()?;
        let output = TaskQueue::new(self.output_capacity);
        let state = Arc::new(AtomicU8::new(PoolState::Idle as u8));
        let stats = Arc::new(WorkerStats::default());
        let exit_barrier = CountingBarrier::new(0);

        let context = ConsumerContext {
            input: input.clone(),
            output: output.clone(),
            handler: Arc::new(handler),
            reporter: Arc::clone(&self.reporter),
            cancellation: self.cancellation,
            stats: Arc::clone(&stats),
        };

        self.reporter.report_started(workers).await;

        // 最後のワーカーが結果キューをクローズし、Stoppedへ遷移させる
        let on_last_exit = {
            let output = output.clone();
            let state = Arc::clone(&state);
            move || {
                output.close();
                state.store(PoolState::Stopped as u8, Ordering::Release);
            }
        };

        state.store(PoolState::Running as u8, Ordering::Release);
        let handles = spawn_consumers(workers, context, &exit_barrier, on_last_exit);
        info!(workers, "worker pool started");

        Ok(WorkerPool {
            input,
            output,
            handles: Mutex::new(handles),
            exit_barrier,
            state,
            stats,
            workers,
            reporter: self.reporter,
            started_at: Instant::now(),
        })
    }
}

/// 起動済みのワーカープール
///
/// ワーカー数はキューのConsumer集合の性質であり、タスクには埋め込まない。
pub struct WorkerPool<T, R> {
    input: TaskQueue<T>,
    output: TaskQueue<TaskResult<R>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    exit_barrier: CountingBarrier,
    state: Arc<AtomicU8>,
    stats: Arc<WorkerStats>,
    workers: usize,
    reporter: Arc<dyn ProgressReporter>,
    started_at: Instant,
}

impl WorkerPool<(), ()> {
    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder::default()
    }
}

impl<T, R> WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// タスクを投入する
    pub async fn submit(&self, payload: T) -> Result<(), QueueError<T>> {
        self.input.push(payload).await
    }

    /// 待機せずにタスクを投入する
    pub fn try_submit(&self, payload: T) -> Result<(), QueueError<T>> {
        self.input.try_push(payload)
    }

    /// 入力キューのハンドル
    pub fn input(&self) -> TaskQueue<T> {
        self.input.clone()
    }

    /// 結果キューのハンドル。最後のワーカー終了時にクローズされる
    pub fn results(&self) -> TaskQueue<TaskResult<R>> {
        self.output.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// 現在のライフサイクル状態
    pub fn state(&self) -> PoolState {
        match PoolState::from_u8(self.state.load(Ordering::Acquire)) {
            PoolState::Running if self.input.is_closed() => PoolState::Draining,
            state => state,
        }
    }

    /// 実行中のワーカー数
    pub fn active_workers(&self) -> usize {
        self.exit_barrier.count()
    }

    /// 入力を閉じずに、全ワーカーの終了を待つ
    ///
    /// 入力が他所でクローズされるか、キャンセルされた場合に戻る。
    pub async fn join(&self) -> ToolkitResult<RunSummary> {
        let handles = std::mem::take(
            &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );

        let mut first_panic = None;
        for result in futures::future::join_all(handles).await {
            if let Err(join_error) = result {
                debug!(error = %join_error, "worker terminated abnormally");
                first_panic.get_or_insert(join_error);
            }
        }
        self.exit_barrier.wait().await;

        let summary = self.summary();
        self.reporter
            .report_completed(summary.completed_tasks, summary.failed_tasks)
            .await;

        match first_panic {
            Some(join_error) => Err(ToolkitError::worker_panicked(join_error)),
            None => Ok(summary),
        }
    }

    /// グレースフルシャットダウン
    ///
    /// 入力をクローズし、処理中のタスクを完了させ、全ワーカーの終了を待ってから戻る。
    pub async fn stop(&self) -> ToolkitResult<RunSummary> {
        if self.input.close() {
            debug!(workers = self.workers, "worker pool draining");
        }
        let summary = self.join().await?;
        info!(
            completed = summary.completed_tasks,
            failed = summary.failed_tasks,
            "worker pool stopped"
        );
        Ok(summary)
    }

    /// ここまでの集計
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            workers: self.workers,
            completed_tasks: self.stats.completed(),
            failed_tasks: self.stats.failed(),
            total_processing_time_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }
}
