// サブコマンドの実装
// 各コマンドはツールキットのコンポーネントを組み合わせた実行例

pub mod batch;
pub mod fan_in;
pub mod pacing;
pub mod pipeline;
pub mod pool;
pub mod wc;

pub use batch::*;
pub use fan_in::*;
pub use pacing::*;
pub use pipeline::*;
pub use pool::*;
pub use wc::*;

use super::args::{Cli, Commands};
use crate::core::{OrchestrationConfig, ProgressReporter};
use crate::file_stats::CountOptions;
use crate::services::{ConsoleProgressReporter, DefaultOrchestrationConfig, NoOpProgressReporter};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::Duration;

/// 設定ファイル > プリセット > 既定値 の順で設定を決める
pub fn load_config(
    config_file: Option<&Path>,
    preset: Option<&str>,
) -> Result<DefaultOrchestrationConfig> {
    if let Some(path) = config_file {
        return DefaultOrchestrationConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    match preset {
        Some(name) => Ok(DefaultOrchestrationConfig::preset(name)?),
        None => Ok(DefaultOrchestrationConfig::default()),
    }
}

/// 設定に応じた進捗報告
pub fn reporter_for(config: &impl OrchestrationConfig) -> Box<dyn ProgressReporter> {
    if config.enable_progress_reporting() {
        Box::new(ConsoleProgressReporter::quiet())
    } else {
        Box::new(NoOpProgressReporter::new())
    }
}

/// デモ用の乱数生成器。シード未指定ならエントロピーから作る
///
/// `stream` ごとに独立した生成器になるので、並行タスク間で共有しない。
pub fn demo_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

/// `[base, 2 * base)` のランダムな遅延
pub fn jittered_delay(rng: &mut StdRng, base_ms: u64) -> Duration {
    use rand::Rng;
    if base_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(base_ms + rng.gen_range(0..base_ms))
}

/// パース済みの引数からサブコマンドを実行する
pub async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.preset.as_deref())?;

    match cli.command {
        Commands::Pool {
            jobs,
            workers,
            delay_ms,
            seed,
        } => {
            let workers = workers.unwrap_or_else(|| config.worker_count());
            execute_pool(&config, jobs, workers, delay_ms, seed).await?;
        }
        Commands::DynamicPool {
            tasks,
            min,
            max,
            delay_ms,
            seed,
        } => {
            execute_dynamic_pool(&config, tasks, min, max, delay_ms, seed).await?;
        }
        Commands::Batch {
            tasks,
            batch_size,
            workers,
            batch_delay_ms,
            cancel_after_ms,
        } => {
            let options = BatchOptions {
                tasks,
                batch_size: batch_size.unwrap_or_else(|| config.batch_size()),
                workers,
                batch_delay: Duration::from_millis(batch_delay_ms),
                cancel_after: cancel_after_ms.map(Duration::from_millis),
            };
            execute_batch(&config, options).await?;
        }
        Commands::Pipeline { count, workers } => {
            execute_pipeline(&config, count, workers).await?;
        }
        Commands::FanIn {
            producers,
            messages,
            delay_ms,
            seed,
        } => {
            execute_fan_in(&config, producers, messages, delay_ms, seed).await?;
        }
        Commands::RateLimit { tasks, per_second } => {
            execute_rate_limit(&config, tasks, per_second).await?;
        }
        Commands::Cancel {
            steps,
            step_ms,
            cancel_after_ms,
        } => {
            execute_cancel(
                steps,
                Duration::from_millis(step_ms),
                Duration::from_millis(cancel_after_ms),
            )
            .await?;
        }
        Commands::Timeout {
            task_ms,
            deadline_ms,
        } => {
            let deadline = deadline_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.deadline());
            execute_timeout(Duration::from_millis(task_ms), deadline).await?;
        }
        Commands::Wc {
            lines,
            words,
            bytes,
            chars,
            recursive,
            workers,
            files,
        } => {
            let options = WcOptions {
                counts: CountOptions {
                    lines,
                    words,
                    bytes,
                    chars,
                },
                recursive,
                workers: workers.unwrap_or_else(|| config.worker_count()),
            };
            let report = execute_wc(&files, &options).await?;
            for line in &report.lines {
                println!("{line}");
            }
            for error in &report.errors {
                eprintln!("taskflow: {error}");
            }
        }
    }

    Ok(())
}
