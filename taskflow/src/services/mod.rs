// サービス層 - 機能別の具象実装
// 各サービスはコア層のトレイトを実装し、エンジン層へ差し込まれる

pub mod config;
pub mod monitoring;
pub mod sizing;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use config::DefaultOrchestrationConfig;
pub use monitoring::{ConsoleProgressReporter, NoOpProgressReporter, TracingProgressReporter};
pub use sizing::{FixedSizing, LoadProportionalSizing, RandomRangeSizing};
