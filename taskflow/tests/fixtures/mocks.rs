// テスト用のモック実装
// 呼び出しを記録するProgressReporter（mockallのモックはtaskflow::core::traitsから利用）

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskflow::core::ProgressReporter;

/// 受け取ったイベントを記録するReporter
///
/// クローンは記録を共有するので、プールへ渡した後も検査できる。
#[derive(Debug, Default, Clone)]
pub struct RecordingProgressReporter {
    started_workers: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    failures: Arc<Mutex<Vec<(u64, String)>>>,
    finished: Arc<Mutex<Option<(usize, usize)>>>,
}

impl RecordingProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_workers(&self) -> usize {
        self.started_workers.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> Vec<(u64, String)> {
        self.failures.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Option<(usize, usize)> {
        *self.finished.lock().unwrap()
    }
}

#[async_trait]
impl ProgressReporter for RecordingProgressReporter {
    async fn report_started(&self, workers: usize) {
        self.started_workers.store(workers, Ordering::SeqCst);
    }

    async fn report_task_completed(&self, _seq: u64, _worker_id: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    async fn report_task_failed(&self, seq: u64, _worker_id: usize, error: &str) {
        self.failures.lock().unwrap().push((seq, error.to_string()));
    }

    async fn report_completed(&self, completed: usize, failed: usize) {
        *self.finished.lock().unwrap() = Some((completed, failed));
    }
}
