// velerotool/src/manager/mod.rs
//! High-level backup/restore operations controller.
//!
//! Resolves cluster names against the inventory and delegates to the
//! engine client. This is the error boundary for create/restore: every
//! failure is logged and collapsed to `false`. Listing is exempt, so a
//! failed query can never be mistaken for "no backups exist".

use chrono::Local;

use crate::config::{AppConfig, Inventory, load_inventory};
use crate::engine::invocation::{ExtraOptions, backup_identifier};
use crate::engine::{BackupDescriptor, VeleroClient};
use crate::errors::{AppError, Result};

pub struct BackupManager {
    inventory: Inventory,
    velero: VeleroClient,
}

impl BackupManager {
    /// Loads the inventory and constructs the engine client. Fails fast
    /// on a malformed inventory or a missing/dead velero binary.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let inventory = load_inventory(&config.inventory_path)?;
        let velero = match &config.velero_binary {
            Some(binary) => VeleroClient::with_binary(config.storage.clone(), binary),
            None => VeleroClient::new(config.storage.clone()),
        }?;
        Ok(BackupManager { inventory, velero })
    }

    /// For callers that already hold a loaded inventory and client.
    pub fn with_client(inventory: Inventory, velero: VeleroClient) -> Self {
        BackupManager { inventory, velero }
    }

    /// Creates a backup of `cluster_name`, named
    /// `{cluster}-{type}-{timestamp}`. Returns `true` on success; any
    /// failure is logged at error severity and reported as `false`.
    pub fn create_backup(
        &self,
        cluster_name: &str,
        backup_type: &str,
        schedule: Option<&str>,
        extra_options: &ExtraOptions,
    ) -> bool {
        let Some(cluster_cfg) = self.inventory.get(cluster_name) else {
            let e = AppError::ClusterNotFound(cluster_name.to_string());
            tracing::error!(cluster = cluster_name, error = %e, "Backup skipped");
            return false;
        };

        let timestamp = Local::now().naive_local();
        let backup_name = backup_identifier(cluster_name, backup_type, timestamp);

        match self.velero.create_backup(
            &backup_name,
            backup_type,
            cluster_cfg.kubeconfig.as_deref(),
            schedule,
            extra_options,
        ) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    cluster = cluster_name,
                    backup = %backup_name,
                    error = %e,
                    "Backup failed"
                );
                false
            }
        }
    }

    /// Restores `backup_name` onto `target_cluster`. Same boolean
    /// contract as `create_backup`.
    pub fn restore_backup(
        &self,
        backup_name: &str,
        target_cluster: &str,
        extra_options: &ExtraOptions,
    ) -> bool {
        let Some(cluster_cfg) = self.inventory.get(target_cluster) else {
            let e = AppError::ClusterNotFound(target_cluster.to_string());
            tracing::error!(cluster = target_cluster, error = %e, "Restore skipped");
            return false;
        };

        match self.velero.restore_backup(
            backup_name,
            cluster_cfg.kubeconfig.as_deref(),
            extra_options,
        ) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    cluster = target_cluster,
                    backup = backup_name,
                    error = %e,
                    "Restore failed"
                );
                false
            }
        }
    }

    /// Lists backups in storage. Errors propagate.
    pub fn list_backups(&self) -> Result<Vec<BackupDescriptor>> {
        self.velero.list_backups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::engine::test_support::{fake_engine, recorded_calls, recording_engine, storage_config};
    use tempfile::tempdir;

    fn inventory_with_prod() -> Inventory {
        let mut inventory = Inventory::new();
        inventory.insert(
            "prod".to_string(),
            ClusterConfig {
                kubeconfig: Some("/kube/prod.yaml".to_string()),
            },
        );
        inventory
    }

    #[test]
    fn test_create_backup_success_end_to_end() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = recording_engine(dir.path());
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        assert!(manager.create_backup("prod", "snapshot", None, &ExtraOptions::new()));

        let calls = recorded_calls(dir.path());
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("backup create prod-snapshot-"));
        assert!(calls[0].contains("--snapshot-volumes=true"));
        assert!(!calls[0].contains("--schedule"));
        Ok(())
    }

    #[test]
    fn test_create_backup_unknown_cluster_skips_engine() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = recording_engine(dir.path());
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        assert!(!manager.create_backup("staging", "manifest", None, &ExtraOptions::new()));
        assert!(recorded_calls(dir.path()).is_empty());
        Ok(())
    }

    #[test]
    fn test_create_backup_invalid_type_returns_false() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = recording_engine(dir.path());
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        assert!(!manager.create_backup("prod", "incremental", None, &ExtraOptions::new()));
        assert!(recorded_calls(dir.path()).is_empty());
        Ok(())
    }

    #[test]
    fn test_create_backup_engine_failure_returns_false() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = fake_engine(dir.path(), "echo 'no space left' >&2\nexit 1");
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        assert!(!manager.create_backup("prod", "snapshot", None, &ExtraOptions::new()));
        Ok(())
    }

    #[test]
    fn test_restore_backup_unknown_target_skips_engine() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = recording_engine(dir.path());
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        assert!(!manager.restore_backup(
            "prod-snapshot-20240101-000000",
            "staging",
            &ExtraOptions::new()
        ));
        assert!(recorded_calls(dir.path()).is_empty());
        Ok(())
    }

    #[test]
    fn test_restore_backup_success() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = recording_engine(dir.path());
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        assert!(manager.restore_backup(
            "prod-snapshot-20240101-000000",
            "prod",
            &ExtraOptions::new()
        ));

        let calls = recorded_calls(dir.path());
        assert!(calls[0].contains("restore create restore-prod-snapshot-20240101-000000"));
        Ok(())
    }

    #[test]
    fn test_list_backups_failure_is_not_swallowed() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let binary = fake_engine(dir.path(), "echo 'connection refused' >&2\nexit 2");
        let velero = VeleroClient::with_binary(storage_config(), binary)?;
        let manager = BackupManager::with_client(inventory_with_prod(), velero);

        let result = manager.list_backups();
        assert!(matches!(
            result,
            Err(AppError::EngineExecutionFailed { .. })
        ));
        Ok(())
    }
}
