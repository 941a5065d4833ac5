// パフォーマンス関連の統合テスト
// 仮想時間（start_paused）で壁時計に依存せずスループットを比較する
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskflow::{
    control::RateLimiter,
    core::{RunSummary, TaskError},
    engine::{spawn_paced_producer, spawn_producer, WorkerPool},
    sync::TaskQueue,
};
use tokio::time::{sleep, Duration, Instant};

const TASKS: u32 = 40;
const TASK_TIME: Duration = Duration::from_millis(20);

/// パフォーマンス測定用の構造体
#[derive(Debug, Clone)]
struct PerformanceMetrics {
    total_time: Duration,
    tasks_processed: usize,
}

impl PerformanceMetrics {
    fn throughput_per_sec(&self) -> f64 {
        self.tasks_processed as f64 / self.total_time.as_secs_f64()
    }
}

async fn run_sleeping_pool(workers: usize) -> (PerformanceMetrics, RunSummary) {
    let started = Instant::now();
    let pool = WorkerPool::builder()
        .workers(workers)
        .start(|n: u32| async move {
            sleep(TASK_TIME).await;
            Ok::<_, TaskError>(n)
        })
        .await
        .unwrap();

    for n in 0..TASKS {
        pool.submit(n).await.unwrap();
    }
    let summary = pool.stop().await.unwrap();

    let metrics = PerformanceMetrics {
        total_time: started.elapsed(),
        tasks_processed: pool.results().collect_available().len(),
    };
    (metrics, summary)
}

#[tokio::test(start_paused = true)]
async fn test_pool_scales_with_worker_count() {
    let (single, single_summary) = run_sleeping_pool(1).await;
    let (parallel, parallel_summary) = run_sleeping_pool(8).await;

    assert_eq!(single.tasks_processed, TASKS as usize);
    assert_eq!(parallel.tasks_processed, TASKS as usize);
    assert_eq!(single_summary.completed_tasks, TASKS as usize);
    assert_eq!(parallel_summary.completed_tasks, TASKS as usize);

    // 1ワーカー: 40 x 20ms、8ワーカー: 5 x 20ms
    assert!(single.total_time >= TASK_TIME * TASKS);
    assert!(parallel.total_time >= TASK_TIME * 5);
    assert!(parallel.total_time < TASK_TIME * 10);
    assert!(parallel.throughput_per_sec() > single.throughput_per_sec() * 4.0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_producer_bounds_throughput() {
    let limiter = Arc::new(RateLimiter::per_second(10).unwrap());
    let queue = TaskQueue::new(4);
    let started = Instant::now();

    let producer = spawn_paced_producer(0..10u32, queue.clone(), Arc::clone(&limiter));
    let received = queue.collect().await;

    assert_eq!(received, (0..10).collect::<Vec<_>>());
    assert_eq!(producer.await.unwrap(), 10);
    // 最初の1件は即時、残り9件は100ms間隔
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_never_exceeds_capacity_under_contention() {
    const CAPACITY: usize = 3;
    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 250;

    let queue = TaskQueue::new(CAPACITY);
    let sources: Vec<TaskQueue<u32>> = (0..PRODUCERS).map(|_| TaskQueue::new(1)).collect();
    let producers: Vec<_> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let base = index as u32 * PER_PRODUCER;
            spawn_producer(base..base + PER_PRODUCER, source.clone())
        })
        .collect();

    // 各ソースを共有キューへ転送し、観測した最大長を記録する
    let max_observed = Arc::new(AtomicUsize::new(0));
    let forwarders: Vec<_> = sources
        .into_iter()
        .map(|source| {
            let queue = queue.clone();
            let max_observed = Arc::clone(&max_observed);
            tokio::spawn(async move {
                while let Some(item) = source.pop().await {
                    queue.push(item).await.unwrap();
                    max_observed.fetch_max(queue.len(), Ordering::SeqCst);
                }
            })
        })
        .collect();

    let consumer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(item) = queue.pop().await {
                received.push(item);
                tokio::task::yield_now().await;
            }
            received
        })
    };

    for forwarder in futures::future::join_all(forwarders).await {
        forwarder.unwrap();
    }
    for producer in producers {
        assert_eq!(producer.await.unwrap(), PER_PRODUCER as usize);
    }
    queue.close();

    let mut received = consumer.await.unwrap();
    received.sort_unstable();
    assert_eq!(received, (0..PRODUCERS * PER_PRODUCER).collect::<Vec<_>>());
    assert!(max_observed.load(Ordering::SeqCst) <= CAPACITY);
}
