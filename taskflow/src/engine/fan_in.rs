// Fan-In - 複数Producerの出力を1つのキューへ集約
// アクティブProducer数が0になった時点で、最後の転送タスクが出力をクローズする

use crate::{
    core::{ToolkitError, ToolkitResult},
    sync::{CountingBarrier, TaskQueue},
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 集約対象のアイテム供給源
#[async_trait]
pub trait Producer<T>: Send {
    /// 次のアイテム。`None` で枯渇
    async fn next_item(&mut self) -> Option<T>;
}

#[async_trait]
impl<T: Send + 'static> Producer<T> for TaskQueue<T> {
    async fn next_item(&mut self) -> Option<T> {
        self.pop().await
    }
}

#[async_trait]
impl<T: Send + 'static> Producer<T> for Box<dyn Producer<T>> {
    async fn next_item(&mut self) -> Option<T> {
        self.as_mut().next_item().await
    }
}

/// `Stream` を Producer として扱うアダプタ
pub struct StreamProducer<S> {
    stream: S,
}

impl<S> StreamProducer<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> Producer<S::Item> for StreamProducer<S>
where
    S: Stream + Unpin + Send,
    S::Item: Send,
{
    async fn next_item(&mut self) -> Option<S::Item> {
        self.stream.next().await
    }
}

/// 起動済みのFan-In集約
pub struct FanIn<T> {
    output: TaskQueue<T>,
    active: CountingBarrier,
    handles: Vec<JoinHandle<usize>>,
}

impl<T: Send + 'static> FanIn<T> {
    /// Producerごとに転送タスクを起動する
    ///
    /// 出力キューは有界で、消費が遅い場合は転送タスクがpushで待機する。
    /// Producerが0個なら出力は即座にクローズされる。
    pub fn aggregate<P>(producers: Vec<P>, capacity: usize) -> Self
    where
        P: Producer<T> + 'static,
    {
        let output = TaskQueue::new(capacity);
        let active = CountingBarrier::new(producers.len());
        info!(producers = producers.len(), capacity, "fan-in started");

        if producers.is_empty() {
            output.close();
        }

        let handles = producers
            .into_iter()
            .enumerate()
            .map(|(producer_id, mut producer)| {
                let output = output.clone();
                let closer = output.clone();
                let exit_guard = active.guard().on_zero(move || {
                    debug!("last producer finished, closing merged output");
                    closer.close();
                });

                tokio::spawn(async move {
                    let _exit_guard = exit_guard;
                    let mut forwarded = 0;
                    while let Some(item) = producer.next_item().await {
                        if output.push(item).await.is_err() {
                            debug!(producer_id, forwarded, "merged output closed early");
                            break;
                        }
                        forwarded += 1;
                    }
                    debug!(producer_id, forwarded, "producer exhausted");
                    forwarded
                })
            })
            .collect();

        Self {
            output,
            active,
            handles,
        }
    }

    /// 集約先キュー。Producer間の到着順は非決定的で、Producer内の順序のみ保証
    pub fn output(&self) -> TaskQueue<T> {
        self.output.clone()
    }

    /// まだ枯渇していないProducer数
    pub fn active_producers(&self) -> usize {
        self.active.count()
    }

    /// 全転送タスクの終了を待ち、転送した総数を返す
    pub async fn join(self) -> ToolkitResult<usize> {
        let mut total = 0;
        for result in futures::future::join_all(self.handles).await {
            total += result.map_err(ToolkitError::worker_panicked)?;
        }
        Ok(total)
    }
}
