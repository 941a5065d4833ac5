// エラーハンドリング統合テスト
use std::io::Write;
use taskflow::{
    control::{with_deadline, DeadlineGuard},
    core::{TaskError, ToolkitError},
    engine::{stage, Batcher, WorkerPool},
    services::{DefaultOrchestrationConfig, LoadProportionalSizing},
    sync::{CancellationToken, TaskQueue},
};
use tempfile::NamedTempFile;
use tokio::time::Duration;

#[tokio::test]
async fn test_push_on_closed_queue_returns_item() {
    let queue = TaskQueue::new(2);
    queue.push("kept".to_string()).await.unwrap();
    queue.close();

    let error = queue.push("rejected".to_string()).await.unwrap_err();
    assert!(error.is_closed());
    assert_eq!(error.into_inner(), "rejected");

    // クローズ後も残りは取り出せる
    assert_eq!(queue.pop().await.as_deref(), Some("kept"));
    assert_eq!(queue.pop().await, None);

    let converted: ToolkitError = queue.try_push("late".to_string()).unwrap_err().into();
    assert!(matches!(converted, ToolkitError::Closed));
}

#[tokio::test]
async fn test_structural_errors_surface_at_construction() {
    let zero_workers = WorkerPool::builder()
        .workers(0)
        .start(|n: u32| async move { Ok::<_, TaskError>(n) })
        .await;
    assert!(matches!(zero_workers, Err(ToolkitError::Configuration { .. })));

    let input: TaskQueue<u32> = TaskQueue::new(1);
    let zero_batch = Batcher::spawn(input.clone(), TaskQueue::new(1), 0);
    assert!(matches!(zero_batch, Err(ToolkitError::Configuration { .. })));

    let zero_stage = stage(input, 0, 1, |n: u32| async move { n });
    assert!(zero_stage.is_err());

    assert!(LoadProportionalSizing::new(4, 2, 1).is_err());
}

#[tokio::test]
async fn test_anyhow_errors_become_task_errors() {
    let pool = WorkerPool::builder()
        .workers(2)
        .start(|text: &'static str| async move {
            let value = text
                .parse::<u32>()
                .map_err(|error| anyhow::anyhow!("parse {text:?}: {error}"))?;
            Ok::<_, TaskError>(value)
        })
        .await
        .unwrap();

    for text in ["1", "two", "3"] {
        pool.submit(text).await.unwrap();
    }
    let summary = pool.stop().await.unwrap();
    let results = pool.results().collect().await;

    assert_eq!(summary.completed_tasks, 2);
    assert_eq!(summary.failed_tasks, 1);
    let failure = results.iter().find(|r| r.is_error()).unwrap();
    assert_eq!(failure.seq, 1);
    assert!(failure
        .outcome
        .as_ref()
        .unwrap_err()
        .message
        .contains("parse \"two\""));
}

#[tokio::test]
async fn test_worker_panic_stays_local_to_its_task() {
    let pool = WorkerPool::builder()
        .workers(1)
        .start(|n: u32| async move {
            assert!(n != 1, "unexpected input");
            Ok::<_, TaskError>(n)
        })
        .await
        .unwrap();

    for n in 0..4 {
        pool.submit(n).await.unwrap();
    }
    let summary = pool.stop().await.unwrap();
    let results = pool.results().collect().await;

    assert_eq!(summary.completed_tasks, 3);
    assert_eq!(summary.failed_tasks, 1);
    let outcomes: Vec<bool> = results.iter().map(|r| r.is_success()).collect();
    assert_eq!(outcomes, vec![true, false, true, true]);
    assert!(pool.results().is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_and_cancellation_errors() {
    let timed_out = with_deadline(Duration::from_millis(100), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
    })
    .await
    .unwrap_err();
    assert!(timed_out.is_timeout());
    assert!(timed_out.to_string().contains("100ms"));

    let token = CancellationToken::new();
    token.cancel();
    assert!(token.check().unwrap_err().is_cancelled());

    let guard = DeadlineGuard::new(Duration::from_millis(10));
    let result = guard
        .run_cancellable(&token, |child| async move { child.cancelled().await })
        .await;
    assert!(result.unwrap_err().is_cancelled());
}

#[test]
fn test_config_file_errors() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "batch_size": 0 }}"#).unwrap();
    let error = DefaultOrchestrationConfig::from_json_file(file.path()).unwrap_err();
    assert!(error.to_string().contains("batch_size"));

    let error = DefaultOrchestrationConfig::preset("bogus").unwrap_err();
    assert!(matches!(error, ToolkitError::Configuration { .. }));
}
