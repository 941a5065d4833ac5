// Pipeline - 変換ステージの連結
// 各ステージは入力キューを消費し、変換結果を出力キューへ送る

use super::producer::spawn_producer;
use crate::{
    core::{ToolkitError, ToolkitResult},
    sync::{CountingBarrier, TaskQueue},
};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// ステージのワーカー群のハンドル
#[derive(Debug)]
pub struct StageWorkers {
    index: usize,
    handles: Vec<JoinHandle<()>>,
}

impl StageWorkers {
    /// 全ワーカーの終了を待つ
    pub async fn join(self) -> ToolkitResult<()> {
        let mut first_panic = None;
        for result in futures::future::join_all(self.handles).await {
            if let Err(join_error) = result {
                first_panic.get_or_insert(join_error);
            }
        }
        debug!(stage = self.index, "stage finished");
        match first_panic {
            Some(join_error) => Err(ToolkitError::worker_panicked(join_error)),
            None => Ok(()),
        }
    }
}

/// 起動済みのステージ
pub struct Stage<U> {
    output: TaskQueue<U>,
    workers: StageWorkers,
}

impl<U> Stage<U> {
    /// 出力キュー。入力が枯渇し全ワーカーが終了した時点でクローズされる
    pub fn output(&self) -> TaskQueue<U> {
        self.output.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.handles.len()
    }

    pub fn into_parts(self) -> (TaskQueue<U>, StageWorkers) {
        (self.output, self.workers)
    }

    pub async fn join(self) -> ToolkitResult<()> {
        self.workers.join().await
    }
}

fn spawn_stage<T, U, F, Fut>(
    index: usize,
    input: TaskQueue<T>,
    workers: usize,
    capacity: usize,
    transform: F,
) -> ToolkitResult<Stage<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send,
{
    if workers == 0 {
        return Err(ToolkitError::configuration(
            "workers",
            "a pipeline stage needs at least one worker",
        ));
    }

    let output = TaskQueue::new(capacity);
    let transform = Arc::new(transform);
    let exit_barrier = CountingBarrier::new(workers);

    let handles = (0..workers)
        .map(|worker_id| {
            let input = input.clone();
            let output = output.clone();
            let transform = Arc::clone(&transform);
            // 最後に終了したワーカーが出力をクローズする
            let closer = output.clone();
            let exit_guard = exit_barrier.guard().on_zero(move || {
                closer.close();
            });

            tokio::spawn(async move {
                let _exit_guard = exit_guard;
                while let Some(item) = input.pop().await {
                    if output.push(transform(item).await).await.is_err() {
                        debug!(stage = index, worker_id, "stage output closed downstream");
                        break;
                    }
                }
            })
        })
        .collect();

    debug!(stage = index, workers, capacity, "stage started");
    Ok(Stage {
        output,
        workers: StageWorkers { index, handles },
    })
}

/// 単一ステージを起動する
///
/// ワーカーが1つならFIFO順を保つ。複数ワーカーの場合、ステージ内の順序は保証しない。
pub fn stage<T, U, F, Fut>(
    input: TaskQueue<T>,
    workers: usize,
    capacity: usize,
    transform: F,
) -> ToolkitResult<Stage<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send,
{
    spawn_stage(0, input, workers, capacity, transform)
}

/// ステージを連結するビルダー
pub struct Pipeline<T> {
    head: TaskQueue<T>,
    producer: Option<JoinHandle<usize>>,
    stages: Vec<StageWorkers>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// イテレータをソースとしてProducerを起動する
    pub fn source<I>(items: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = T> + Send + 'static,
        I::IntoIter: Send,
    {
        let head = TaskQueue::new(capacity);
        let producer = spawn_producer(items, head.clone());
        Self {
            head,
            producer: Some(producer),
            stages: Vec::new(),
        }
    }

    /// 既存のキューをソースにする。クローズは呼び出し側の責任
    pub fn from_queue(queue: TaskQueue<T>) -> Self {
        Self {
            head: queue,
            producer: None,
            stages: Vec::new(),
        }
    }

    /// 現在の末尾に変換ステージを追加する
    pub fn stage<U, F, Fut>(
        mut self,
        workers: usize,
        capacity: usize,
        transform: F,
    ) -> ToolkitResult<Pipeline<U>>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send,
    {
        let index = self.stages.len();
        let (output, workers) =
            spawn_stage(index, self.head, workers, capacity, transform)?.into_parts();
        self.stages.push(workers);

        Ok(Pipeline {
            head: output,
            producer: self.producer,
            stages: self.stages,
        })
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// 最終出力キューと、全タスクを待つハンドルを返す
    pub fn finish(self) -> (TaskQueue<T>, PipelineHandle) {
        (
            self.head,
            PipelineHandle {
                producer: self.producer,
                stages: self.stages,
            },
        )
    }
}

/// パイプライン全体のハンドル
pub struct PipelineHandle {
    producer: Option<JoinHandle<usize>>,
    stages: Vec<StageWorkers>,
}

impl PipelineHandle {
    /// Producerと全ステージの終了を待ち、ソースが投入した件数を返す
    ///
    /// 最終出力を消費しながら待つこと。消費しないと容量分で止まる。
    pub async fn join(self) -> ToolkitResult<usize> {
        let produced = match self.producer {
            Some(producer) => producer.await.map_err(ToolkitError::worker_panicked)?,
            None => 0,
        };
        for stage in self.stages {
            stage.join().await?;
        }
        Ok(produced)
    }
}
