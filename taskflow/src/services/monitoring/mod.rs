// 進捗監視機能
// プール起動、タスク成功・失敗、完了の通知

pub mod implementations;

// 公開API
pub use implementations::{ConsoleProgressReporter, NoOpProgressReporter, TracingProgressReporter};
