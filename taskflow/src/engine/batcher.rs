// Batcher - 入力アイテムを固定サイズのバッチへまとめる

use crate::{
    core::{Batch, ToolkitError, ToolkitResult},
    sync::TaskQueue,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 起動済みのバッチャー
///
/// 入力が枯渇したら残りを最終バッチとして1つだけ送り、出力キューをクローズする。
/// 空のバッチは送らない。
pub struct Batcher {
    size: usize,
    handle: JoinHandle<u64>,
}

impl Batcher {
    pub fn spawn<T>(
        input: TaskQueue<T>,
        output: TaskQueue<Batch<T>>,
        size: usize,
    ) -> ToolkitResult<Self>
    where
        T: Send + 'static,
    {
        if size == 0 {
            return Err(ToolkitError::configuration(
                "batch_size",
                "batch size must be at least 1",
            ));
        }

        let handle = tokio::spawn(async move {
            let mut emitted = 0u64;
            let mut pending = Vec::with_capacity(size);

            loop {
                let item = input.pop().await;
                let exhausted = item.is_none();
                if let Some(item) = item {
                    pending.push(item);
                }

                if pending.len() == size || (exhausted && !pending.is_empty()) {
                    let items = std::mem::replace(&mut pending, Vec::with_capacity(size));
                    let batch = Batch {
                        index: emitted,
                        items,
                    };
                    debug!(batch_index = emitted, items = batch.len(), "batch emitted");
                    if output.push(batch).await.is_err() {
                        warn!(batch_index = emitted, "batch output closed, stopping batcher");
                        break;
                    }
                    emitted += 1;
                }

                if exhausted {
                    break;
                }
            }

            output.close();
            emitted
        });

        Ok(Self { size, handle })
    }

    pub fn batch_size(&self) -> usize {
        self.size
    }

    /// 終了を待ち、送ったバッチ数を返す
    pub async fn join(self) -> ToolkitResult<u64> {
        self.handle.await.map_err(ToolkitError::worker_panicked)
    }
}
