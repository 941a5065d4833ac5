// プールサイズ決定ポリシー
// 負荷シグナルからワーカー数を一度だけ決める

pub mod implementations;

// 公開API
pub use implementations::{FixedSizing, LoadProportionalSizing, RandomRangeSizing};
