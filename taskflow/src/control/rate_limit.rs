// RateLimiter - 固定間隔のペーシングゲート
// バースト許容（トークンバケット）ではなく、直前の通過からの最小間隔のみを保証する

use crate::core::{ToolkitError, ToolkitResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::trace;

/// 固定間隔で呼び出しを通過させるレートリミッタ
///
/// 連続する2回の通過は必ず `interval` 以上離れる。上限の間隔は保証しない。
/// 複数タスクから同時に `wait()` しても直列化される。
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_admitted: Mutex<Option<Instant>>,
    admitted: AtomicU64,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: Mutex::new(None),
            admitted: AtomicU64::new(0),
        }
    }

    /// 1秒あたり `rate` 回に制限する
    pub fn per_second(rate: u32) -> ToolkitResult<Self> {
        if rate == 0 {
            return Err(ToolkitError::configuration(
                "per_second",
                "rate must be at least 1",
            ));
        }
        Ok(Self::new(Duration::from_secs(1) / rate))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 前回の通過から `interval` 経過するまで待機する。初回は即座に戻る
    pub async fn wait(&self) {
        let mut last_admitted = self.last_admitted.lock().await;
        if let Some(previous) = *last_admitted {
            match previous.checked_add(self.interval) {
                Some(next) => sleep_until(next).await,
                // 表現できないほど先の時刻は、タイマーの上限まで待つ
                None => sleep(self.interval).await,
            }
        }

        let now = Instant::now();
        *last_admitted = Some(now);
        let admitted = self.admitted.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(admitted, "rate limiter admitted call");
    }

    /// これまでに通過させた回数
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }
}
