//! 並行タスクオーケストレーションのツールキット
//!
//! 有界キュー、ワーカープール、バッチャー、パイプライン、Fan-In、
//! レートリミッタ、キャンセルトークン、デッドラインガードを提供する。
//! 全コンポーネントは [`sync::TaskQueue`] と [`sync::CountingBarrier`] だけで同期する。

pub mod cli;
pub mod control;
pub mod core;
pub mod engine;
pub mod file_scanner;
pub mod file_stats;
pub mod services;
pub mod sync;

pub use crate::control::{with_deadline, with_deadline_cancellable, DeadlineGuard, RateLimiter};
pub use crate::core::{
    Batch, PoolState, QueueError, RunSummary, Task, TaskError, TaskResult, ToolkitError,
    ToolkitResult,
};
pub use crate::engine::{stage, Batcher, FanIn, Pipeline, WorkerPool};
pub use crate::sync::{CancellationToken, CountingBarrier, TaskQueue};
