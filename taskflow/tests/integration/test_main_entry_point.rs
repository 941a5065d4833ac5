// main.rsとエントリーポイントのテスト
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use taskflow::cli::{execute, Cli, Commands};
use tempfile::TempDir;

fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    if path.ends_with("deps") {
        path.pop(); // remove deps directory
    }
    path.join("taskflow")
}

#[test]
fn test_parse_pool_with_global_flags() {
    let cli = Cli::try_parse_from([
        "taskflow", "pool", "--jobs", "4", "-w", "2", "--seed", "7", "-p", "testing", "-v",
    ])
    .unwrap();

    assert!(cli.verbose);
    assert_eq!(cli.preset.as_deref(), Some("testing"));
    match cli.command {
        Commands::Pool {
            jobs,
            workers,
            delay_ms,
            seed,
        } => {
            assert_eq!(jobs, 4);
            assert_eq!(workers, Some(2));
            assert_eq!(delay_ms, 500);
            assert_eq!(seed, Some(7));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_defaults_for_demo_commands() {
    let cli = Cli::try_parse_from(["taskflow", "batch"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Batch {
            tasks: 16,
            batch_size: None,
            workers: 3,
            batch_delay_ms: 2000,
            cancel_after_ms: None,
        }
    ));

    let cli = Cli::try_parse_from(["taskflow", "fan-in", "--producers", "2"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::FanIn {
            producers: 2,
            messages: 5,
            ..
        }
    ));

    let cli = Cli::try_parse_from(["taskflow", "timeout", "--task-ms", "10"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Timeout {
            task_ms: 10,
            deadline_ms: None,
        }
    ));
}

#[test]
fn test_parse_wc_flags_and_files() {
    let cli = Cli::try_parse_from(["taskflow", "wc", "-l", "-r", "a.txt", "dir"]).unwrap();
    match cli.command {
        Commands::Wc {
            lines,
            words,
            bytes,
            chars,
            recursive,
            files,
            ..
        } => {
            assert!(lines && recursive);
            assert!(!words && !bytes && !chars);
            assert_eq!(files, vec![PathBuf::from("a.txt"), PathBuf::from("dir")]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_rejects_invalid_arguments() {
    assert!(Cli::try_parse_from(["taskflow"]).is_err());
    assert!(Cli::try_parse_from(["taskflow", "pool", "--jobs", "many"]).is_err());
    assert!(Cli::try_parse_from(["taskflow", "unknown"]).is_err());
}

#[tokio::test]
async fn test_execute_pipeline_and_timeout_commands() {
    let cli = Cli::try_parse_from(["taskflow", "-p", "testing", "pipeline", "-c", "3"]).unwrap();
    execute(cli).await.unwrap();

    let cli = Cli::try_parse_from([
        "taskflow", "timeout", "--task-ms", "5", "--deadline-ms", "1000",
    ])
    .unwrap();
    execute(cli).await.unwrap();
}

#[tokio::test]
async fn test_execute_rejects_broken_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("taskflow.json");
    fs::write(&config_path, "{ not json").unwrap();

    let cli = Cli::try_parse_from([
        "taskflow",
        "--config",
        config_path.to_str().unwrap(),
        "pipeline",
    ])
    .unwrap();

    let error = execute(cli).await.unwrap_err();
    assert!(format!("{error:#}").contains("failed to load config"));
}

#[test]
fn test_cli_help() {
    let binary_path = get_binary_path();
    if !binary_path.exists() {
        println!("Skipping CLI test - binary not found");
        return;
    }

    let output = Command::new(&binary_path)
        .arg("--help")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("pool"));
    assert!(stdout.contains("pipeline"));
    assert!(stdout.contains("fan-in"));
    assert!(stdout.contains("wc"));
}

#[test]
fn test_cli_wc_integration() {
    let binary_path = get_binary_path();
    if !binary_path.exists() {
        println!("Skipping CLI wc integration test - binary not found");
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("sample.txt");
    fs::write(&file_path, "one two\nthree\n").unwrap();

    let output = Command::new(&binary_path)
        .args(["wc", "-l", "-w"])
        .arg(&file_path)
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("  2   3"));
    assert!(stdout.contains("sample.txt"));
}

#[test]
fn test_cli_unknown_preset_fails() {
    let binary_path = get_binary_path();
    if !binary_path.exists() {
        println!("Skipping CLI preset test - binary not found");
        return;
    }

    let output = Command::new(&binary_path)
        .args(["-p", "bogus", "pipeline"])
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("bogus"));
}
