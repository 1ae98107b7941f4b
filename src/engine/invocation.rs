// velerotool/src/engine/invocation.rs
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{AppError, Result};

/// What a backup captures: cluster manifests only, or manifests plus
/// persistent volume snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupType {
    Manifest,
    Snapshot,
}

impl BackupType {
    /// Value for velero's `--snapshot-volumes` flag.
    pub fn snapshot_volumes(self) -> bool {
        matches!(self, BackupType::Snapshot)
    }
}

impl FromStr for BackupType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manifest" => Ok(BackupType::Manifest),
            "snapshot" => Ok(BackupType::Snapshot),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid backup type: '{}' (expected 'manifest' or 'snapshot')",
                other
            ))),
        }
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupType::Manifest => write!(f, "manifest"),
            BackupType::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Extra engine options, keyed by option name. Keys are rendered to flags
/// with underscores replaced by hyphens, e.g. `ttl_hours` -> `--ttl-hours`.
pub type ExtraOptions = BTreeMap<String, String>;

/// Canonical backup name: `{cluster}-{type}-{timestamp}`, sortable at
/// second granularity. Uniqueness is best-effort; two requests for the
/// same cluster and type within the same second collide. The type string
/// is validated later by the engine client, before any subprocess runs.
pub fn backup_identifier(
    cluster_name: &str,
    backup_type: &str,
    timestamp: NaiveDateTime,
) -> String {
    format!(
        "{}-{}-{}",
        cluster_name,
        backup_type,
        timestamp.format("%Y%m%d-%H%M%S")
    )
}

/// Restore names derive from the backup name with a fixed prefix, so a
/// second restore of the same backup collides at the engine. Velero
/// rejects the duplicate; that is the idempotency contract.
pub fn restore_identifier(backup_name: &str) -> String {
    format!("restore-{}", backup_name)
}

fn extend_with_extra_options(args: &mut Vec<String>, extra_options: &ExtraOptions) {
    for (key, value) in extra_options {
        args.push(format!("--{}", key.replace('_', "-")));
        args.push(value.clone());
    }
}

/// Argument vector for `velero backup create`.
pub fn backup_create_args(
    backup_name: &str,
    backup_type: BackupType,
    storage_location: &str,
    schedule: Option<&str>,
    extra_options: &ExtraOptions,
) -> Vec<String> {
    let mut args = vec![
        "backup".to_string(),
        "create".to_string(),
        backup_name.to_string(),
        "--storage-location".to_string(),
        storage_location.to_string(),
        "--wait".to_string(),
        format!("--snapshot-volumes={}", backup_type.snapshot_volumes()),
    ];

    if let Some(schedule) = schedule {
        args.push("--schedule".to_string());
        args.push(schedule.to_string());
    }

    extend_with_extra_options(&mut args, extra_options);
    args
}

/// Argument vector for `velero restore create`.
pub fn restore_create_args(
    restore_name: &str,
    backup_name: &str,
    extra_options: &ExtraOptions,
) -> Vec<String> {
    let mut args = vec![
        "restore".to_string(),
        "create".to_string(),
        restore_name.to_string(),
        "--from-backup".to_string(),
        backup_name.to_string(),
        "--wait".to_string(),
    ];

    extend_with_extra_options(&mut args, extra_options);
    args
}

pub fn backup_list_args() -> Vec<String> {
    vec![
        "backup".to_string(),
        "get".to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]
}

pub fn version_probe_args() -> Vec<String> {
    vec!["version".to_string(), "--client-only".to_string()]
}
