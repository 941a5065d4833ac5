// プールサイズ決定ポリシーの具象実装

use crate::core::{SizingPolicy, ToolkitError, ToolkitResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

fn check_range(min: usize, max: usize) -> ToolkitResult<()> {
    if min == 0 {
        return Err(ToolkitError::configuration("min", "must be at least 1"));
    }
    if min > max {
        return Err(ToolkitError::configuration(
            "max",
            format!("must not be less than min ({min} > {max})"),
        ));
    }
    Ok(())
}

/// 負荷に関係なく固定数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizing(pub usize);

impl SizingPolicy for FixedSizing {
    fn worker_count(&self, _load: usize) -> usize {
        self.0
    }
}

/// 負荷に比例したワーカー数を `[min, max]` に収める
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProportionalSizing {
    min: usize,
    max: usize,
    tasks_per_worker: usize,
}

impl LoadProportionalSizing {
    pub fn new(min: usize, max: usize, tasks_per_worker: usize) -> ToolkitResult<Self> {
        check_range(min, max)?;
        if tasks_per_worker == 0 {
            return Err(ToolkitError::configuration(
                "tasks_per_worker",
                "must be at least 1",
            ));
        }
        Ok(Self {
            min,
            max,
            tasks_per_worker,
        })
    }
}

impl SizingPolicy for LoadProportionalSizing {
    fn worker_count(&self, load: usize) -> usize {
        load.div_ceil(self.tasks_per_worker).clamp(self.min, self.max)
    }
}

/// `[min, max]` から乱数で選ぶ
///
/// 乱数生成器はインスタンスごとに持ち、シードを固定すれば再現できる。
#[derive(Debug)]
pub struct RandomRangeSizing {
    min: usize,
    max: usize,
    rng: Mutex<StdRng>,
}

impl RandomRangeSizing {
    pub fn new(min: usize, max: usize) -> ToolkitResult<Self> {
        Self::with_rng(min, max, StdRng::from_entropy())
    }

    pub fn seeded(min: usize, max: usize, seed: u64) -> ToolkitResult<Self> {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: usize, max: usize, rng: StdRng) -> ToolkitResult<Self> {
        check_range(min, max)?;
        Ok(Self {
            min,
            max,
            rng: Mutex::new(rng),
        })
    }
}

impl SizingPolicy for RandomRangeSizing {
    fn worker_count(&self, _load: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(self.min..=self.max)
    }
}
