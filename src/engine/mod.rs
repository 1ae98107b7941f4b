// velerotool/src/engine/mod.rs
//! Low-level Velero command executor.
//!
//! Builds engine invocations, runs them with per-call credential scoping,
//! and classifies the outcome. Owns no state beyond the storage location
//! configuration it was constructed with.

pub mod invocation;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use which::which;

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use invocation::{BackupType, ExtraOptions};

/// One backup as reported by the engine, passed through unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDescriptor {
    pub name: String,
    pub creation_timestamp: Option<String>,
    pub phase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackupItem {
    metadata: BackupMetadata,
    #[serde(default)]
    status: BackupStatus,
}

#[derive(Debug, Deserialize)]
struct BackupMetadata {
    name: String,
    #[serde(rename = "creationTimestamp")]
    creation_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BackupStatus {
    phase: Option<String>,
}

impl From<BackupItem> for BackupDescriptor {
    fn from(item: BackupItem) -> Self {
        BackupDescriptor {
            name: item.metadata.name,
            creation_timestamp: item.metadata.creation_timestamp,
            phase: item.status.phase,
        }
    }
}

pub struct VeleroClient {
    binary: PathBuf,
    storage: StorageConfig,
}

impl VeleroClient {
    /// Resolves the `velero` binary from PATH and probes it. Fails with
    /// `DependencyMissing` if the binary is absent or the probe fails.
    pub fn new(storage: StorageConfig) -> Result<Self> {
        let binary = which("velero").map_err(|_| {
            AppError::DependencyMissing(
                "velero executable not found in PATH. Please ensure the Velero CLI is installed and in your PATH.".to_string(),
            )
        })?;
        Self::with_binary(storage, binary)
    }

    /// Uses an explicit engine binary path instead of a PATH lookup. The
    /// version probe still runs; a dead binary fails construction, not
    /// the first backup.
    pub fn with_binary(storage: StorageConfig, binary: impl Into<PathBuf>) -> Result<Self> {
        let client = VeleroClient {
            binary: binary.into(),
            storage,
        };
        client.probe_version()?;
        Ok(client)
    }

    fn probe_version(&self) -> Result<()> {
        let args = invocation::version_probe_args();
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| {
                AppError::DependencyMissing(format!(
                    "Velero probe could not start `{}`: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(AppError::DependencyMissing(format!(
                "Velero version probe failed with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tracing::debug!(binary = %self.binary.display(), "Velero probe succeeded");
        Ok(())
    }

    /// Runs one engine invocation and waits for it to finish. Cluster and
    /// storage credentials are set on the child's environment only; the
    /// orchestrator's own environment is never touched, so concurrent
    /// invocations cannot observe each other's scoping.
    fn exec(&self, args: &[String], kubeconfig: Option<&str>) -> Result<Output> {
        let rendered = format!("velero {}", args.join(" "));
        tracing::debug!(command = %rendered, "Executing Velero command");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env("AWS_ACCESS_KEY_ID", &self.storage.access_key)
            .env("AWS_SECRET_ACCESS_KEY", &self.storage.secret_key)
            .env("AWS_ENDPOINT_URL", &self.storage.endpoint);
        if let Some(kubeconfig) = kubeconfig {
            command.env("KUBECONFIG", kubeconfig);
        }

        let output = command.output().map_err(|e| AppError::ProcessSpawnFailed {
            command: rendered.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(AppError::EngineExecutionFailed {
                command: rendered,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output)
    }

    /// Creates a backup and blocks until the engine reports completion.
    ///
    /// `backup_type` must be `manifest` or `snapshot`; anything else fails
    /// with `InvalidArgument` before a subprocess is spawned.
    pub fn create_backup(
        &self,
        backup_name: &str,
        backup_type: &str,
        kubeconfig: Option<&str>,
        schedule: Option<&str>,
        extra_options: &ExtraOptions,
    ) -> Result<()> {
        let backup_type: BackupType = backup_type.parse()?;

        let args = invocation::backup_create_args(
            backup_name,
            backup_type,
            &self.storage.bucket,
            schedule,
            extra_options,
        );
        self.exec(&args, kubeconfig)?;

        tracing::info!(backup = backup_name, backup_type = %backup_type, "Backup created successfully");
        Ok(())
    }

    /// Restores from an existing backup, blocking until completion. The
    /// restore name derives from the backup name; repeating a restore
    /// collides at the engine, which rejects the duplicate.
    pub fn restore_backup(
        &self,
        backup_name: &str,
        kubeconfig: Option<&str>,
        extra_options: &ExtraOptions,
    ) -> Result<()> {
        let restore_name = invocation::restore_identifier(backup_name);
        let args = invocation::restore_create_args(&restore_name, backup_name, extra_options);
        self.exec(&args, kubeconfig)?;

        tracing::info!(restore = %restore_name, "Restore completed successfully");
        Ok(())
    }

    /// Lists backups in the configured storage location, in the order the
    /// engine reports them. No caching, no filtering.
    pub fn list_backups(&self) -> Result<Vec<BackupDescriptor>> {
        let args = invocation::backup_list_args();
        let output = self.exec(&args, None)?;
        let stdout = String::from_utf8(output.stdout)?;
        parse_backup_list(&stdout)
    }
}

/// Velero prints a `BackupList` when more than one backup exists and a
/// bare `Backup` object when there is exactly one.
fn parse_backup_list(stdout: &str) -> Result<Vec<BackupDescriptor>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    if value.get("items").is_some() {
        #[derive(Deserialize)]
        struct BackupList {
            #[serde(default)]
            items: Vec<BackupItem>,
        }
        let list: BackupList = serde_json::from_value(value)?;
        Ok(list.items.into_iter().map(BackupDescriptor::from).collect())
    } else {
        let item: BackupItem = serde_json::from_value(value)?;
        Ok(vec![item.into()])
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    pub fn storage_config() -> StorageConfig {
        StorageConfig {
            endpoint: "http://minio:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: "backups".to_string(),
        }
    }

    /// Writes a fake `velero` shell script into `dir`. The script answers
    /// the version probe with exit 0 and runs `body` for everything else.
    pub fn fake_engine(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("velero");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"version\" ]; then exit 0; fi\n{}\n",
            body
        );
        fs::write(&path, script).expect("write fake engine script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("chmod fake engine script");
        path
    }

    /// Fake engine that appends each non-probe invocation's arguments to
    /// `calls.log` in `dir` and exits 0.
    pub fn recording_engine(dir: &Path) -> PathBuf {
        fake_engine(
            dir,
            &format!("echo \"$@\" >> '{}'\nexit 0", dir.join("calls.log").display()),
        )
    }

    pub fn recorded_calls(dir: &Path) -> Vec<String> {
        match fs::read_to_string(dir.join("calls.log")) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}
