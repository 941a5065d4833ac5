// エンドツーエンド統合テスト
use crate::fixtures::{setup_nested_tree, write_word_files, RecordingProgressReporter};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskflow::{
    cli::{execute_wc, WcOptions},
    core::{Batch, TaskError},
    engine::{spawn_producer, Batcher, FanIn, Pipeline, WorkerPool},
    file_stats::CountOptions,
    services::DefaultOrchestrationConfig,
    sync::{CancellationToken, TaskQueue},
};
use tempfile::TempDir;
use tokio::time::{sleep, Duration};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pipeline_feeds_worker_pool() {
    let (stage_output, pipeline) = Pipeline::source(0..50u32, 4)
        .stage(2, 4, |n| async move { n * 2 })
        .unwrap()
        .finish();

    let reporter = RecordingProgressReporter::new();
    let pool = WorkerPool::builder()
        .workers(3)
        .output_capacity(4)
        .reporter(reporter.clone())
        .start_with_input(stage_output, |n: u32| async move {
            if n % 10 == 0 {
                Err(TaskError::new(format!("multiple of ten: {n}")))
            } else {
                Ok(n + 1)
            }
        })
        .await
        .unwrap();

    let results = pool.results();
    let collector = tokio::spawn(async move { results.collect().await });

    // 入力はパイプラインが閉じるので join で待つ
    let summary = pool.join().await.unwrap();
    assert_eq!(pipeline.join().await.unwrap(), 50);
    let results = collector.await.unwrap();

    assert_eq!(results.len(), 50);
    assert_eq!(summary.failed_tasks, 10);
    assert_eq!(summary.completed_tasks, 40);
    assert_eq!(reporter.started_workers(), 3);
    assert_eq!(reporter.completed(), 40);
    assert_eq!(reporter.failures().len(), 10);
    assert_eq!(reporter.finished(), Some((40, 10)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_in_merges_pool_results() {
    let mut pools = Vec::new();
    for base in [0u32, 1_000] {
        let pool = WorkerPool::builder()
            .workers(2)
            .output_capacity(2)
            .start(move |n: u32| async move { Ok::<_, TaskError>(base + n) })
            .await
            .unwrap();
        pools.push(pool);
    }

    let fan_in = FanIn::aggregate(pools.iter().map(|pool| pool.results()).collect(), 3);
    let merged = fan_in.output();
    let collector = tokio::spawn(async move { merged.collect().await });

    for pool in &pools {
        for n in 0..25 {
            pool.submit(n).await.unwrap();
        }
    }
    for pool in &pools {
        pool.stop().await.unwrap();
    }

    let merged = collector.await.unwrap();
    let values: HashSet<u32> = merged
        .into_iter()
        .map(|result| result.outcome.unwrap())
        .collect();
    let expected: HashSet<u32> = (0..25).chain(1_000..1_025).collect();
    assert_eq!(values, expected);
    assert_eq!(fan_in.join().await.unwrap(), 50);
}

#[tokio::test]
async fn test_batched_pool_cancelled_after_first_batch() {
    let input = TaskQueue::new(16);
    let batches = TaskQueue::new(8);
    let token = CancellationToken::new();
    let batcher = Batcher::spawn(input.clone(), batches.clone(), 5).unwrap();
    spawn_producer(1..=16u32, input.clone());

    let started = Arc::new(AtomicUsize::new(0));
    let pool = {
        let started = Arc::clone(&started);
        let token = token.clone();
        WorkerPool::builder()
            .workers(3)
            .cancellation(token.clone())
            .start_with_input(batches.clone(), move |batch: Batch<u32>| {
                // 最初のバッチが始まった時点でキャンセル
                if started.fetch_add(1, Ordering::SeqCst) == 0 {
                    token.cancel();
                }
                async move {
                    sleep(Duration::from_millis(30)).await;
                    Ok::<_, TaskError>(batch.len())
                }
            })
            .await
            .unwrap()
    };

    let summary = pool.join().await.unwrap();
    let results = pool.results().collect().await;

    // 取り出し済みのバッチは完了し、それ以降は取り出さない
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome, Ok(5));
    assert_eq!(summary.completed_tasks, 1);

    batches.close();
    input.close();
    batcher.join().await.unwrap();
}

#[tokio::test]
async fn test_batched_pool_processes_every_item() {
    let input = TaskQueue::new(4);
    let batches = TaskQueue::new(2);
    let batcher = Batcher::spawn(input.clone(), batches.clone(), 5).unwrap();
    spawn_producer(1..=16u32, input);

    let pool = WorkerPool::builder()
        .workers(3)
        .start_with_input(batches, |batch: Batch<u32>| async move {
            Ok::<_, TaskError>(batch.into_items())
        })
        .await
        .unwrap();

    pool.join().await.unwrap();
    assert_eq!(batcher.join().await.unwrap(), 4);

    let mut items: Vec<u32> = pool
        .results()
        .collect()
        .await
        .into_iter()
        .flat_map(|result| result.outcome.unwrap())
        .collect();
    items.sort_unstable();
    assert_eq!(items, (1..=16).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_word_count_over_directory_tree() {
    let temp_dir = TempDir::new().unwrap();
    setup_nested_tree(temp_dir.path());
    let mut files = write_word_files(temp_dir.path(), 3);
    files.push(temp_dir.path().join("subdir1"));

    let report = execute_wc(
        &files,
        &WcOptions {
            counts: CountOptions {
                lines: true,
                words: true,
                chars: true,
                ..CountOptions::default()
            },
            recursive: true,
            workers: 2,
        },
    )
    .await
    .unwrap();

    assert!(report.errors.is_empty());
    // words_00..02 と subdir1/a.txt
    assert_eq!(report.counted_files, 4);
    assert_eq!(report.total.lines, 5);
    assert_eq!(report.total.words, 1 + 2 + 3 + 2);
    assert!(report.lines.last().unwrap().ends_with(" total"));
}

#[tokio::test]
async fn test_config_drives_pool_construction() {
    let config = DefaultOrchestrationConfig::testing().with_workers(4);
    let pool = taskflow::engine::WorkerPoolBuilder::from_config(&config)
        .start(|n: u8| async move { Ok::<_, TaskError>(n) })
        .await
        .unwrap();

    assert_eq!(pool.worker_count(), 4);
    assert_eq!(pool.input().capacity(), 4);
    pool.stop().await.unwrap();
}
