use super::reporter_for;
use crate::core::{Batch, OrchestrationConfig, RunSummary, TaskError, TaskResult};
use crate::engine::{spawn_producer, Batcher, WorkerPool};
use crate::sync::{CancellationToken, TaskQueue};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::info;

/// Configuration for the batch command
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub tasks: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub batch_delay: Duration,
    pub cancel_after: Option<Duration>,
}

/// バッチ処理の実行結果
#[derive(Debug)]
pub struct BatchReport {
    pub emitted_batches: u64,
    pub started_batches: usize,
    pub results: Vec<TaskResult<Batch<usize>>>,
    pub summary: RunSummary,
    pub cancelled: bool,
}

/// タスクをバッチにまとめ、ワーカープールで処理する
///
/// キャンセル時は取り出し済みのバッチだけを完了させ、残りは破棄する。
pub async fn execute_batch(
    config: &impl OrchestrationConfig,
    options: BatchOptions,
) -> Result<BatchReport> {
    let capacity = config.queue_capacity();
    let input = TaskQueue::new(capacity);
    let batches = TaskQueue::new(capacity);
    let token = CancellationToken::new();

    let started = Arc::new(AtomicUsize::new(0));
    let first_started = Arc::new(Notify::new());
    let handler = {
        let started = Arc::clone(&started);
        let first_started = Arc::clone(&first_started);
        let batch_delay = options.batch_delay;
        move |batch: Batch<usize>| {
            started.fetch_add(1, Ordering::SeqCst);
            first_started.notify_one();
            async move {
                println!("🔄 Processing batch {}: {:?}", batch.index, batch.items);
                sleep(batch_delay).await;
                Ok::<_, TaskError>(batch)
            }
        }
    };

    let pool = WorkerPool::builder()
        .workers(options.workers)
        .output_capacity(capacity)
        .cancellation(token.clone())
        .reporter(reporter_for(config))
        .start_with_input(batches.clone(), handler)
        .await?;

    // プール起動に成功してからバッチャーを起動する。失敗時はプールを止める
    let batcher = match Batcher::spawn(input.clone(), batches.clone(), options.batch_size) {
        Ok(batcher) => batcher,
        Err(error) => {
            pool.stop().await?;
            return Err(error.into());
        }
    };

    let results = pool.results();
    let collector = tokio::spawn(async move { results.collect().await });
    let producer = spawn_producer(1..=options.tasks, input.clone());

    if let Some(cancel_after) = options.cancel_after {
        let token = token.clone();
        tokio::spawn(async move {
            first_started.notified().await;
            sleep(cancel_after).await;
            println!("🛑 Cancelling remaining batches...");
            token.cancel();
        });
    }

    // 入力の枯渇（バッチャーがクローズ）かキャンセルまで待つ
    let summary = pool.join().await?;

    // キャンセル後に残ったバッチと入力を破棄し、上流を解放する
    batches.close();
    input.close();
    let emitted_batches = batcher.join().await?;
    producer.await?;

    let results = collector.await?;
    for result in &results {
        if let Ok(batch) = &result.outcome {
            println!(
                "✅ Worker {} completed batch {}: {:?}",
                result.worker_id + 1,
                batch.index,
                batch.items
            );
        }
    }

    let report = BatchReport {
        emitted_batches,
        started_batches: started.load(Ordering::SeqCst),
        results,
        summary,
        cancelled: token.is_cancelled(),
    };
    info!(
        emitted = report.emitted_batches,
        started = report.started_batches,
        cancelled = report.cancelled,
        "batch run finished"
    );
    println!("\n🏁 {} of {} batches processed.", report.results.len(), report.emitted_batches);
    Ok(report)
}
