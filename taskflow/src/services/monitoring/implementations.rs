// 進捗監視の具象実装

use crate::core::ProgressReporter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// コンソール出力による進捗報告実装
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    quiet: bool,
    finished: AtomicUsize,
}

impl ConsoleProgressReporter {
    /// 進捗を表示する間隔（タスク数）
    const PROGRESS_EVERY: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    fn tick(&self) {
        let finished = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.quiet && finished % Self::PROGRESS_EVERY == 0 {
            println!("📊 Progress: {finished} tasks finished");
        }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, workers: usize) {
        if !self.quiet {
            println!("🚀 Starting {workers} workers...");
        }
    }

    async fn report_task_completed(&self, _seq: u64, _worker_id: usize) {
        self.tick();
    }

    async fn report_task_failed(&self, seq: u64, worker_id: usize, error: &str) {
        self.tick();
        if !self.quiet {
            eprintln!("❌ Task {seq} failed on worker {worker_id}: {error}");
        }
    }

    async fn report_completed(&self, completed: usize, failed: usize) {
        if !self.quiet {
            println!("✅ Completed! Succeeded: {completed}, Failed: {failed}");
        }
    }
}

/// tracingイベントとして進捗を報告する実装
#[derive(Debug, Default, Clone)]
pub struct TracingProgressReporter;

impl TracingProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for TracingProgressReporter {
    async fn report_started(&self, workers: usize) {
        info!(workers, "pool started");
    }

    async fn report_task_completed(&self, seq: u64, worker_id: usize) {
        debug!(seq, worker_id, "task completed");
    }

    async fn report_task_failed(&self, seq: u64, worker_id: usize, error: &str) {
        warn!(seq, worker_id, error, "task failed");
    }

    async fn report_completed(&self, completed: usize, failed: usize) {
        info!(completed, failed, "pool finished");
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _workers: usize) {
        // 何もしない
    }

    async fn report_task_completed(&self, _seq: u64, _worker_id: usize) {
        // 何もしない
    }

    async fn report_task_failed(&self, _seq: u64, _worker_id: usize, _error: &str) {
        // 何もしない
    }

    async fn report_completed(&self, _completed: usize, _failed: usize) {
        // 何もしない
    }
}
