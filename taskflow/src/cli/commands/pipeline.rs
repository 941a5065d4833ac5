use crate::core::OrchestrationConfig;
use crate::engine::Pipeline;
use anyhow::Result;
use std::time::Instant;

/// generate -> square -> format の3段パイプライン
pub async fn execute_pipeline(
    config: &impl OrchestrationConfig,
    count: u64,
    workers: usize,
) -> Result<Vec<String>> {
    let started = Instant::now();
    let capacity = config.queue_capacity();

    let (output, handle) = Pipeline::source(1..=count, capacity)
        .stage(workers, capacity, |n| async move { n * n })?
        .stage(workers, capacity, |n| async move { format!("Result: {n}") })?
        .finish();

    let mut lines = Vec::new();
    while let Some(line) = output.pop().await {
        println!("{line}");
        lines.push(line);
    }
    handle.join().await?;

    println!("\n🏁 Pipeline completed in {:?}", started.elapsed());
    Ok(lines)
}
