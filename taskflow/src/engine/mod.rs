// エンジン層 - 並列処理とオーケストレーション
// 同期プリミティブを組み合わせてプール・バッチ・パイプライン・Fan-Inを提供

pub mod batcher;
pub mod consumer;
pub mod fan_in;
pub mod pipeline;
pub mod pool;
pub mod producer;

// 公開API - 主要コンポーネント
pub use batcher::Batcher;
pub use fan_in::{FanIn, Producer, StreamProducer};
pub use pipeline::{stage, Pipeline, PipelineHandle, Stage};
pub use pool::{WorkerPool, WorkerPoolBuilder};
pub use producer::{spawn_paced_producer, spawn_producer};
