// オーケストレーションのトレイト定義
// 設定・進捗報告・タスク処理・プールサイズ決定の抽象化

use super::error::TaskError;
use async_trait::async_trait;
use mockall::automock;
use std::future::Future;
use std::time::Duration;

/// オーケストレーション設定を抽象化するトレイト
#[automock]
pub trait OrchestrationConfig: Send + Sync {
    /// ワーカー数を取得
    fn worker_count(&self) -> usize;

    /// キュー容量を取得（0は同期ハンドオフ）
    fn queue_capacity(&self) -> usize;

    /// バッチサイズを取得
    fn batch_size(&self) -> usize;

    /// レートリミッタの発行間隔
    fn rate_interval(&self) -> Duration;

    /// デッドラインガードの既定予算
    fn deadline(&self) -> Duration;

    /// 進捗報告を有効にするかどうか
    fn enable_progress_reporting(&self) -> bool;
}

// OrchestrationConfig for Box<dyn OrchestrationConfig>
impl OrchestrationConfig for Box<dyn OrchestrationConfig> {
    fn worker_count(&self) -> usize {
        self.as_ref().worker_count()
    }

    fn queue_capacity(&self) -> usize {
        self.as_ref().queue_capacity()
    }

    fn batch_size(&self) -> usize {
        self.as_ref().batch_size()
    }

    fn rate_interval(&self) -> Duration {
        self.as_ref().rate_interval()
    }

    fn deadline(&self) -> Duration {
        self.as_ref().deadline()
    }

    fn enable_progress_reporting(&self) -> bool {
        self.as_ref().enable_progress_reporting()
    }
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// プール起動時の報告
    async fn report_started(&self, workers: usize);

    /// タスク成功時の報告
    async fn report_task_completed(&self, seq: u64, worker_id: usize);

    /// タスク失敗時の報告
    async fn report_task_failed(&self, seq: u64, worker_id: usize, error: &str);

    /// 全ワーカー終了時の報告
    async fn report_completed(&self, completed: usize, failed: usize);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, workers: usize) {
        self.as_ref().report_started(workers).await
    }

    async fn report_task_completed(&self, seq: u64, worker_id: usize) {
        self.as_ref().report_task_completed(seq, worker_id).await
    }

    async fn report_task_failed(&self, seq: u64, worker_id: usize, error: &str) {
        self.as_ref().report_task_failed(seq, worker_id, error).await
    }

    async fn report_completed(&self, completed: usize, failed: usize) {
        self.as_ref().report_completed(completed, failed).await
    }
}

/// ワーカーが各タスクに適用する処理
///
/// クロージャ `Fn(T) -> impl Future<Output = Result<R, TaskError>>` はそのまま使える。
#[async_trait]
pub trait TaskHandler<T, R>: Send + Sync
where
    T: Send + 'static,
{
    async fn handle(&self, payload: T) -> Result<R, TaskError>;
}

#[async_trait]
impl<T, R, F, Fut> TaskHandler<T, R> for F
where
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, TaskError>> + Send,
    T: Send + 'static,
    R: Send + 'static,
{
    async fn handle(&self, payload: T) -> Result<R, TaskError> {
        self(payload).await
    }
}

/// 負荷シグナルからワーカー数を決めるポリシー
///
/// プール構築時に一度だけ呼ばれる。
#[automock]
pub trait SizingPolicy: Send + Sync {
    fn worker_count(&self, load: usize) -> usize;
}

impl SizingPolicy for Box<dyn SizingPolicy> {
    fn worker_count(&self, load: usize) -> usize {
        self.as_ref().worker_count(load)
    }
}
