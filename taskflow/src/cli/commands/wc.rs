use crate::core::{TaskError, TaskResult};
use crate::engine::WorkerPool;
use crate::file_scanner::FileScanner;
use crate::file_stats::{CountOptions, FileStats};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the wc command
#[derive(Debug, Clone)]
pub struct WcOptions {
    pub counts: CountOptions,
    pub recursive: bool,
    pub workers: usize,
}

/// wcの出力。失敗したファイルは `errors` に入り、残りの処理は続行する
#[derive(Debug, Default)]
pub struct WcReport {
    pub lines: Vec<String>,
    pub errors: Vec<String>,
    pub total: FileStats,
    pub counted_files: usize,
}

fn display_label(path: &Path) -> String {
    path.display().to_string()
}

/// 入力パスを展開する。`-r` なしのディレクトリはエラーとして扱う
fn expand_inputs(files: &[PathBuf], recursive: bool, errors: &mut Vec<String>) -> Vec<PathBuf> {
    if files.is_empty() {
        return vec![PathBuf::from("-")];
    }

    let mut inputs = Vec::new();
    for path in files {
        if FileScanner::is_stdin(path) || !path.is_dir() {
            inputs.push(path.clone());
        } else if recursive {
            match FileScanner::scan_directory(path) {
                Ok(found) => inputs.extend(found),
                Err(error) => errors.push(format!("{}: {error}", display_label(path))),
            }
        } else {
            errors.push(format!("{}: Is a directory", display_label(path)));
        }
    }
    inputs
}

/// 1ファイル分の統計。ブロッキングI/Oは専用スレッドで行う
async fn count_file(path: PathBuf) -> Result<FileStats, TaskError> {
    let stats = tokio::task::spawn_blocking(move || {
        if FileScanner::is_stdin(&path) {
            FileStats::from_reader(std::io::stdin().lock())
        } else {
            FileStats::from_path(&path)
        }
    })
    .await
    .map_err(|error| TaskError::new(error.to_string()))??;
    Ok(stats)
}

/// ファイルごとの統計をワーカープールで並行計算し、入力順に整形する
pub async fn execute_wc(files: &[PathBuf], options: &WcOptions) -> Result<WcReport> {
    let mut report = WcReport::default();
    let inputs = expand_inputs(files, options.recursive, &mut report.errors);
    let requested = inputs.len() + report.errors.len();

    let pool = WorkerPool::builder()
        .workers(options.workers)
        .input_capacity(options.workers * 2)
        .output_capacity(options.workers * 2)
        .start(count_file)
        .await?;

    let results = pool.results();
    let collector = tokio::spawn(async move { results.collect().await });

    for path in &inputs {
        pool.submit(path.clone()).await?;
    }
    let summary = pool.stop().await?;
    debug!(
        files = inputs.len(),
        failed = summary.failed_tasks,
        "word count finished"
    );

    // seq は投入順の位置と一致する
    let mut results: Vec<TaskResult<FileStats>> = collector.await?;
    results.sort_by_key(|result| result.seq);

    for result in results {
        let label = usize::try_from(result.seq)
            .ok()
            .and_then(|index| inputs.get(index))
            .map(|path| display_label(path))
            .unwrap_or_default();
        match result.outcome {
            Ok(stats) => {
                report.lines.push(stats.format(&options.counts, &label));
                report.total += stats;
                report.counted_files += 1;
            }
            Err(error) => report.errors.push(format!("{label}: {error}")),
        }
    }

    if requested > 1 && report.counted_files > 0 {
        report.lines.push(report.total.format(&options.counts, "total"));
    }
    Ok(report)
}
