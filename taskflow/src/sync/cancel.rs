// CancellationToken - 協調的キャンセル
// 一方向（未キャンセル → キャンセル済み）のフラグを全保持者で共有する

use crate::core::{ToolkitError, ToolkitResult};
use tracing::debug;

/// 協調的キャンセルのトークン
///
/// `cancel()` は冪等で、全クローン・全子トークンから次の観測点で見える。
/// 処理側は `is_cancelled()` / `check()` を一定間隔でポーリングするか、
/// `cancelled().await` と `select!` で競合させて自ら終了する。
/// プリエンプションはしない。
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 子トークンを作成する。親のキャンセルは子に伝播するが、逆は伝播しない
    pub fn child_token(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
        }
    }

    /// キャンセルを要求する（冪等）
    pub fn cancel(&self) {
        if !self.inner.is_cancelled() {
            debug!("cancellation requested");
        }
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// キャンセルされるまで待機する
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }

    /// 観測点: キャンセル済みなら `ToolkitError::Cancelled`
    pub fn check(&self) -> ToolkitResult<()> {
        if self.is_cancelled() {
            Err(ToolkitError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// future をキャンセルと競合させる。キャンセルが先なら future はdropされる
    pub async fn run_until_cancelled<F>(&self, future: F) -> ToolkitResult<F::Output>
    where
        F: std::future::Future,
    {
        tokio::select! {
            biased;
            _ = self.inner.cancelled() => Err(ToolkitError::Cancelled),
            output = future => Ok(output),
        }
    }
}
