// 設定管理の具象実装

use crate::core::{OrchestrationConfig, ToolkitError, ToolkitResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// 間隔・デッドラインの上限（1年）
const MAX_DURATION_MS: u64 = 365 * 24 * 60 * 60 * 1_000;

/// デフォルト設定実装
///
/// JSONから読み込む場合、省略したフィールドは既定値になる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultOrchestrationConfig {
    workers: usize,
    queue_capacity: usize,
    batch_size: usize,
    rate_interval_ms: u64,
    deadline_ms: u64,
    enable_progress: bool,
}

impl DefaultOrchestrationConfig {
    pub fn new(cpu_count: usize) -> Self {
        Self {
            workers: cpu_count.max(1),
            queue_capacity: 100,
            batch_size: 5,
            rate_interval_ms: 500,
            deadline_ms: 2_000,
            enable_progress: true,
        }
    }

    /// 大量タスク向け: ワーカー・キュー・バッチを大きく取る
    pub fn high_throughput() -> Self {
        Self::new(num_cpus::get() * 2)
            .with_queue_capacity(1_000)
            .with_batch_size(50)
            .with_rate_interval(Duration::ZERO)
            .with_progress_reporting(false)
    }

    /// テスト向け: 小さく決定的な設定
    pub fn testing() -> Self {
        Self::new(2)
            .with_queue_capacity(4)
            .with_batch_size(2)
            .with_rate_interval(Duration::from_millis(1))
            .with_deadline(Duration::from_millis(100))
            .with_progress_reporting(false)
    }

    /// 名前からプリセットを選ぶ
    pub fn preset(name: &str) -> ToolkitResult<Self> {
        match name {
            "default" => Ok(Self::default()),
            "high-throughput" | "high_throughput" => Ok(Self::high_throughput()),
            "testing" => Ok(Self::testing()),
            other => Err(ToolkitError::configuration(
                "preset",
                format!("unknown preset '{other}'"),
            )),
        }
    }

    /// JSONファイルから読み込み、検証する
    pub fn from_json_file(path: impl AsRef<Path>) -> ToolkitResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    /// 構造的に不正な値を拒否する
    pub fn validate(&self) -> ToolkitResult<()> {
        if self.workers == 0 {
            return Err(ToolkitError::configuration(
                "workers",
                "must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(ToolkitError::configuration(
                "batch_size",
                "must be at least 1",
            ));
        }
        for (field, millis) in [
            ("rate_interval_ms", self.rate_interval_ms),
            ("deadline_ms", self.deadline_ms),
        ] {
            if millis > MAX_DURATION_MS {
                return Err(ToolkitError::configuration(field, "must be at most one year"));
            }
        }
        Ok(())
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_rate_interval(mut self, interval: Duration) -> Self {
        self.rate_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = deadline.as_millis() as u64;
        self
    }

    pub fn with_progress_reporting(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }
}

impl Default for DefaultOrchestrationConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl OrchestrationConfig for DefaultOrchestrationConfig {
    fn worker_count(&self) -> usize {
        self.workers
    }

    fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn rate_interval(&self) -> Duration {
        Duration::from_millis(self.rate_interval_ms)
    }

    fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    fn enable_progress_reporting(&self) -> bool {
        self.enable_progress
    }
}
