//! Kubernetes Backup/Restore Tool
//!
//! Provides CLI interface for Velero-based cluster backup and restore
//! operations against an S3-compatible storage location

// velerotool/src/main.rs
mod config;
mod engine;
mod errors;
mod manager;

use anyhow::{Context, Result};
use config::AppConfig;
use engine::invocation::ExtraOptions;
use manager::BackupManager;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

/// Main entry point for the backup/restore tool
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run_app() {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_app() -> Result<()> {
    // Expects config.json in the working directory, pointing at the
    // cluster inventory YAML and the storage location.
    let config_path = PathBuf::from("config.json");
    let app_config = AppConfig::load_from_json(&config_path).with_context(|| {
        format!(
            "Failed to load application configuration from {}",
            config_path.display()
        )
    })?;

    let manager = BackupManager::new(&app_config)
        .context("Failed to initialize backup manager")?;

    let args: Vec<String> = env::args().collect();
    let choice = if args.len() > 1 {
        args[1].trim().to_string()
    } else {
        prompt_choice()?
    };

    match choice.as_str() {
        "1" | "backup" => {
            println!("🚀 Starting Backup Process...");
            let cluster = arg_or_prompt(&args, 2, "Cluster name")?;
            let backup_type = arg_or_prompt(&args, 3, "Backup type (manifest/snapshot)")?;
            let (schedule, rest) = split_schedule(&args[args.len().min(4)..]);
            let extra_options = parse_extra_options(rest)?;

            if !manager.create_backup(&cluster, &backup_type, schedule.as_deref(), &extra_options)
            {
                anyhow::bail!("Backup of cluster '{}' failed", cluster);
            }
        }
        "2" | "restore" => {
            println!("🔄 Starting Restore Process...");
            let backup_name = arg_or_prompt(&args, 2, "Backup name")?;
            let target_cluster = arg_or_prompt(&args, 3, "Target cluster")?;
            let extra_options = parse_extra_options(&args[args.len().min(4)..])?;

            if !manager.restore_backup(&backup_name, &target_cluster, &extra_options) {
                anyhow::bail!(
                    "Restore of '{}' onto cluster '{}' failed",
                    backup_name,
                    target_cluster
                );
            }
        }
        "3" | "list" => {
            let backups = manager.list_backups().context("Failed to list backups")?;
            if backups.is_empty() {
                println!("No backups found in storage.");
            } else {
                println!("{:<50} {:<25} {}", "NAME", "CREATED", "STATUS");
                for backup in backups {
                    println!(
                        "{:<50} {:<25} {}",
                        backup.name,
                        backup.creation_timestamp.as_deref().unwrap_or("-"),
                        backup.phase.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        _ => {
            println!("❌ Invalid choice. Please enter '1' (backup), '2' (restore), or '3' (list).");
            anyhow::bail!("Invalid operation choice");
        }
    }
    Ok(())
}

/// Prompts user to select an operation
///
/// Returns the user's choice as String
fn prompt_choice() -> Result<String> {
    println!("Select an operation:");
    println!("1. Create Backup (or type 'backup')");
    println!("2. Restore Backup (or type 'restore')");
    println!("3. List Backups (or type 'list')");
    prompt("Enter your choice")
}

fn arg_or_prompt(args: &[String], index: usize, label: &str) -> Result<String> {
    match args.get(index) {
        Some(value) => Ok(value.trim().to_string()),
        None => prompt(label),
    }
}

fn prompt(label: &str) -> Result<String> {
    use std::io::{Write, stdin, stdout};

    print!("{}: ", label);
    stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    Ok(input.trim().to_string())
}

/// A bare argument after the backup type is a cron schedule; everything
/// else must be `--option value` pairs.
fn split_schedule(args: &[String]) -> (Option<String>, &[String]) {
    match args.first() {
        Some(first) if !first.starts_with("--") => (Some(first.clone()), &args[1..]),
        _ => (None, args),
    }
}

/// Parses trailing `--option value` pairs into extra engine options.
fn parse_extra_options(args: &[String]) -> Result<ExtraOptions> {
    let mut options = ExtraOptions::new();
    let mut iter = args.iter();
    while let Some(key) = iter.next() {
        let key = key
            .strip_prefix("--")
            .with_context(|| format!("Expected an option starting with '--', got '{}'", key))?;
        let value = iter
            .next()
            .with_context(|| format!("Option '--{}' is missing a value", key))?;
        options.insert(key.to_string(), value.to_string());
    }
    Ok(options)
}
