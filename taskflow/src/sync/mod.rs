// 同期プリミティブ層 - キュー、完了バリア、キャンセルトークン
// エンジン層の全コンポーネントはこの3つだけで同期する

pub mod barrier;
pub mod cancel;
pub mod queue;

pub use barrier::{BarrierGuard, CountingBarrier};
pub use cancel::CancellationToken;
pub use queue::TaskQueue;
