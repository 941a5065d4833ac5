use super::{demo_rng, jittered_delay, reporter_for};
use crate::core::{OrchestrationConfig, RunSummary, TaskError, TaskHandler, TaskResult};
use crate::engine::WorkerPool;
use crate::services::RandomRangeSizing;
use anyhow::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// 1ジョブ分の模擬処理。ジョブ番号ごとの乱数で処理時間を決める
#[derive(Debug, Clone, Copy)]
pub struct SimulatedJob {
    delay_ms: u64,
    seed: Option<u64>,
}

impl SimulatedJob {
    pub fn new(delay_ms: u64, seed: Option<u64>) -> Self {
        Self { delay_ms, seed }
    }
}

#[async_trait]
impl TaskHandler<usize, (usize, Duration)> for SimulatedJob {
    async fn handle(&self, job: usize) -> Result<(usize, Duration), TaskError> {
        let delay = jittered_delay(&mut demo_rng(self.seed, job as u64), self.delay_ms);
        sleep(delay).await;
        Ok((job, delay))
    }
}

fn print_job_results(results: &[TaskResult<(usize, Duration)>], label: &str) {
    for result in results {
        match &result.outcome {
            Ok((job, delay)) => println!(
                "✅ Worker {} completed {label} {job} in {delay:?}",
                result.worker_id + 1
            ),
            Err(error) => println!("❌ Worker {} failed: {error}", result.worker_id + 1),
        }
    }
}

/// 固定数ワーカーへジョブを分配する
pub async fn execute_pool(
    config: &impl OrchestrationConfig,
    jobs: usize,
    workers: usize,
    delay_ms: u64,
    seed: Option<u64>,
) -> Result<RunSummary> {
    let started = Instant::now();
    let pool = WorkerPool::builder()
        .workers(workers)
        .input_capacity(config.queue_capacity())
        .output_capacity(config.queue_capacity())
        .reporter(reporter_for(config))
        .start(SimulatedJob::new(delay_ms, seed))
        .await?;

    println!("🚀 Fan-out: {jobs} jobs across {workers} workers");
    let results = pool.results();
    let collector = tokio::spawn(async move { results.collect().await });

    for job in 1..=jobs {
        pool.submit(job).await?;
    }
    let summary = pool.stop().await?;
    let results = collector.await?;

    print_job_results(&results, "job");
    println!("\n🏁 All jobs processed in {:?}", started.elapsed());
    Ok(summary)
}

/// ワーカー数を範囲から一度だけ選んで起動する
pub async fn execute_dynamic_pool(
    config: &impl OrchestrationConfig,
    tasks: usize,
    min: usize,
    max: usize,
    delay_ms: u64,
    seed: Option<u64>,
) -> Result<RunSummary> {
    let policy = match seed {
        Some(seed) => RandomRangeSizing::seeded(min, max, seed)?,
        None => RandomRangeSizing::new(min, max)?,
    };

    let pool = WorkerPool::builder()
        .sizing(policy, tasks)
        .input_capacity(tasks.max(1))
        .output_capacity(config.queue_capacity())
        .reporter(reporter_for(config))
        .start(SimulatedJob::new(delay_ms, seed))
        .await?;
    println!("🚀 Starting with {} dynamic workers", pool.worker_count());

    let results = pool.results();
    let collector = tokio::spawn(async move { results.collect().await });

    for task in 1..=tasks {
        pool.submit(task).await?;
    }
    let summary = pool.stop().await?;

    print_job_results(&collector.await?, "task");
    println!("\n🏁 All tasks processed with dynamic workers.");
    Ok(summary)
}
