// Producer - キューへの投入機能

use crate::{control::RateLimiter, sync::TaskQueue};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Producer: 全アイテムをキューへ投入し、最後にキューをクローズする
///
/// 投入できた件数を返す。キューが外部でクローズされた場合は途中で終了する。
pub fn spawn_producer<I>(items: I, queue: TaskQueue<I::Item>) -> JoinHandle<usize>
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    tokio::spawn(async move {
        let mut sent = 0;
        for item in items {
            if queue.push(item).await.is_err() {
                // キューが閉じられた場合は正常終了
                debug!(sent, "queue closed before producer finished");
                break;
            }
            sent += 1;
        }
        queue.close();
        sent
    })
}

/// レートリミッタで投入間隔を制御するProducer
pub fn spawn_paced_producer<I>(
    items: I,
    queue: TaskQueue<I::Item>,
    limiter: Arc<RateLimiter>,
) -> JoinHandle<usize>
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    tokio::spawn(async move {
        let mut sent = 0;
        for item in items {
            limiter.wait().await;
            if queue.push(item).await.is_err() {
                debug!(sent, "queue closed before paced producer finished");
                break;
            }
            sent += 1;
        }
        queue.close();
        sent
    })
}
