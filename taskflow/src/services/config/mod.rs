// 設定管理機能
// 既定値・プリセット・JSONファイルからの読み込み

pub mod implementations;

// 公開API
pub use implementations::DefaultOrchestrationConfig;
