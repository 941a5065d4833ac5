// Custom error types for task orchestration
// キュー・ワーカープール・デッドライン用のエラー型定義

use std::time::Duration;
use thiserror::Error;

/// ツールキット全体のエラー型
///
/// タスク単位の失敗（[`TaskError`]）はここには含めず、
/// 各タスクの [`crate::core::TaskResult`] に閉じ込める。
#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("キューは既にクローズされています")]
    Closed,

    #[error("キャンセルされました")]
    Cancelled,

    #[error("タイムアウト: {after:?} 以内に完了しませんでした")]
    TimedOut { after: Duration },

    #[error("ワーカー異常終了: {source}")]
    WorkerPanicked {
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("設定エラー: {field} - {reason}")]
    Configuration { field: String, reason: String },

    #[error("I/Oエラー: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("設定ファイル解析エラー: {source}")]
    ConfigParse {
        #[from]
        source: serde_json::Error,
    },
}

impl ToolkitError {
    /// 設定エラーの作成
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// タイムアウトエラーの作成
    pub fn timed_out(after: Duration) -> Self {
        Self::TimedOut { after }
    }

    /// JoinErrorの変換
    pub fn worker_panicked(source: tokio::task::JoinError) -> Self {
        Self::WorkerPanicked { source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// ツールキット操作の結果型
pub type ToolkitResult<T> = std::result::Result<T, ToolkitError>;

/// push失敗時のエラー。投入しようとした要素を呼び出し側に返す
#[derive(Error, PartialEq, Eq)]
pub enum QueueError<T> {
    #[error("キューが満杯です")]
    Full(T),

    #[error("キューは既にクローズされています")]
    Closed(T),
}

impl<T> QueueError<T> {
    /// 返却された要素を取り出す
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

// 要素型にDebugを要求しないよう手動実装
impl<T> std::fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> From<QueueError<T>> for ToolkitError {
    fn from(_: QueueError<T>) -> Self {
        ToolkitError::Closed
    }
}

/// 個別タスクの失敗
///
/// ワーカー関数が返すエラー。タスク境界を越えて伝播せず、
/// そのタスクの結果としてのみ報告される。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("タスクエラー: {message}")]
pub struct TaskError {
    pub message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// キャンセルを観測してタスクを打ち切った場合
    pub fn cancelled() -> Self {
        Self::new(ToolkitError::Cancelled.to_string())
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(format!("{error:#}"))
    }
}

impl From<ToolkitError> for TaskError {
    fn from(error: ToolkitError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<std::io::Error> for TaskError {
    fn from(error: std::io::Error) -> Self {
        Self::new(error.to_string())
    }
}
