// タスク・結果・バッチなどのデータ型定義

use super::error::TaskError;
use std::fmt;

/// キューに投入される作業単位
///
/// `seq` は投入順序（プール単位で単調増加）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task<T> {
    pub seq: u64,
    pub payload: T,
}

impl<T> Task<T> {
    pub fn new(seq: u64, payload: T) -> Self {
        Self { seq, payload }
    }
}

/// 1タスクにつき1つだけ生成される処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult<R> {
    pub seq: u64,
    pub worker_id: usize,
    pub outcome: Result<R, TaskError>,
}

impl<R> TaskResult<R> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

/// 最大 B 個の要素をまとめたバッチ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// 0始まりの発行順序
    pub index: u64,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// ワーカープールのライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PoolState {
    Idle = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl PoolState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// プール実行全体のサマリー
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub workers: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub total_processing_time_ms: u64,
}

impl RunSummary {
    pub fn total_tasks(&self) -> usize {
        self.completed_tasks + self.failed_tasks
    }

    pub fn average_time_per_task_ms(&self) -> f64 {
        let total = self.total_tasks();
        if total > 0 {
            self.total_processing_time_ms as f64 / total as f64
        } else {
            0.0
        }
    }
}
