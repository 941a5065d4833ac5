// CountingBarrier - 完了カウンタによる待ち合わせ
// 開始時にN、完了ごとに1減らし、0になるまで待機する

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

struct Inner {
    count: AtomicUsize,
    zero: Notify,
}

/// カウントが0になるまで待機できるバリア
///
/// ワーカー終了の待ち合わせ、Fan-Inのアクティブproducer数管理に使う。
#[derive(Clone)]
pub struct CountingBarrier {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CountingBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingBarrier")
            .field("count", &self.count())
            .finish()
    }
}

impl CountingBarrier {
    pub fn new(count: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                count: AtomicUsize::new(count),
                zero: Notify::new(),
            }),
        }
    }

    /// 残りカウント
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    pub fn is_zero(&self) -> bool {
        self.count() == 0
    }

    /// 待ち合わせ対象を追加する
    pub fn add(&self, n: usize) {
        self.inner.count.fetch_add(n, Ordering::AcqRel);
    }

    /// 1件完了を記録する。このcallでカウントが0になった場合のみ `true`
    pub fn done(&self) -> bool {
        let previous = self
            .inner
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });

        match previous {
            Ok(1) => {
                self.inner.zero.notify_waiters();
                true
            }
            Ok(_) => false,
            Err(_) => {
                warn!("counting barrier released more times than it was armed");
                false
            }
        }
    }

    /// カウントが0になるまで待機する
    pub async fn wait(&self) {
        loop {
            let mut notified = std::pin::pin!(self.inner.zero.notified());
            notified.as_mut().enable();
            if self.is_zero() {
                return;
            }
            notified.await;
        }
    }

    /// drop時に `done()` を呼ぶガードを作成する
    pub fn guard(&self) -> BarrierGuard {
        BarrierGuard {
            barrier: self.clone(),
            on_zero: None,
        }
    }
}

/// スコープ終了（panic含む）で1件完了を記録するガード
pub struct BarrierGuard {
    barrier: CountingBarrier,
    on_zero: Option<Box<dyn FnOnce() + Send>>,
}

impl BarrierGuard {
    /// 最後の1件だった場合に実行する処理を登録する
    pub fn on_zero(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_zero = Some(Box::new(f));
        self
    }
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        if self.barrier.done() {
            if let Some(on_zero) = self.on_zero.take() {
                on_zero();
            }
        }
    }
}
