use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(about = "Concurrent task orchestration: worker pools, pipelines, fan-in, pacing and deadlines")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file (overrides --preset)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Configuration preset (default, high-throughput, testing)
    #[arg(short = 'p', long, global = true)]
    pub preset: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fan out jobs across a fixed worker pool
    Pool {
        /// Number of jobs to submit
        #[arg(short, long, default_value = "10")]
        jobs: usize,

        /// Number of workers (defaults to the configured worker count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Base simulated job time; each job takes between 1x and 2x of it
        #[arg(long, default_value = "500")]
        delay_ms: u64,

        /// Seed for simulated job times
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Pick the pool size from a [min, max] range at startup
    DynamicPool {
        /// Number of tasks to submit
        #[arg(short, long, default_value = "20")]
        tasks: usize,

        /// Minimum number of workers
        #[arg(long, default_value = "2")]
        min: usize,

        /// Maximum number of workers
        #[arg(long, default_value = "5")]
        max: usize,

        /// Base simulated task time
        #[arg(long, default_value = "500")]
        delay_ms: u64,

        /// Seed for the pool size and task times
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Group tasks into fixed-size batches processed by a pool
    Batch {
        /// Number of tasks
        #[arg(short, long, default_value = "16")]
        tasks: usize,

        /// Items per batch (defaults to the configured batch size)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Number of workers
        #[arg(short, long, default_value = "3")]
        workers: usize,

        /// Simulated processing time per batch
        #[arg(long, default_value = "2000")]
        batch_delay_ms: u64,

        /// Cancel the pool this many milliseconds after the first batch starts
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },

    /// Run a generate -> square -> format pipeline
    Pipeline {
        /// How many numbers to generate
        #[arg(short, long, default_value = "5")]
        count: u64,

        /// Workers per stage
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Merge messages from several producers into one stream
    FanIn {
        /// Number of producers
        #[arg(long, default_value = "3")]
        producers: usize,

        /// Messages per producer
        #[arg(short, long, default_value = "5")]
        messages: usize,

        /// Base simulated time between messages
        #[arg(long, default_value = "500")]
        delay_ms: u64,

        /// Seed for simulated times
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Execute tasks at a fixed pace
    RateLimit {
        /// Number of tasks
        #[arg(short, long, default_value = "10")]
        tasks: usize,

        /// Tasks admitted per second (defaults to the configured interval)
        #[arg(long)]
        per_second: Option<u32>,
    },

    /// Cancel a long-running task that polls its token
    Cancel {
        /// Number of steps the task would run
        #[arg(long, default_value = "5")]
        steps: u32,

        /// Duration of each step
        #[arg(long, default_value = "1000")]
        step_ms: u64,

        /// Cancel after this many milliseconds
        #[arg(long, default_value = "3000")]
        cancel_after_ms: u64,
    },

    /// Race a slow task against a deadline
    Timeout {
        /// How long the task takes
        #[arg(long, default_value = "3000")]
        task_ms: u64,

        /// Deadline (defaults to the configured deadline)
        #[arg(long)]
        deadline_ms: Option<u64>,
    },

    /// Print line, word, and byte counts for each file, computed concurrently
    Wc {
        /// Count lines
        #[arg(short, long)]
        lines: bool,

        /// Count words
        #[arg(short, long)]
        words: bool,

        /// Count bytes
        #[arg(short = 'c', long)]
        bytes: bool,

        /// Count characters
        #[arg(short = 'm', long)]
        chars: bool,

        /// Walk directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Number of workers (defaults to the configured worker count)
        #[arg(long)]
        workers: Option<usize>,

        /// Files to count; standard input when empty or "-"
        files: Vec<PathBuf>,
    },
}
