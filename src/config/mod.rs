// velerotool/src/config/mod.rs
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, Result};

// Structs for deserializing config.json
#[derive(Debug, Clone, Deserialize)]
pub struct JsonStorageConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    pub inventory_path: Option<PathBuf>,
    pub storage: Option<JsonStorageConfig>,
    pub velero_binary: Option<PathBuf>,
}

/// Named object-storage location backups are written to and read from.
/// Passed through to the engine; never validated for connectivity here.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

/// One inventory entry: how to reach a target cluster.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub kubeconfig: Option<String>,
}

pub type Inventory = HashMap<String, ClusterConfig>;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inventory_path: PathBuf,
    pub storage: StorageConfig,
    pub velero_binary: Option<PathBuf>,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)?;
        let raw: RawJsonConfig = serde_json::from_str(&config_content)?;

        let inventory_path = raw.inventory_path.ok_or_else(|| {
            AppError::Config("'inventory_path' must be set in config.json".to_string())
        })?;

        let storage = storage_from_raw(raw.storage)?;

        Ok(AppConfig {
            inventory_path,
            storage,
            velero_binary: raw.velero_binary,
        })
    }
}

fn storage_from_raw(raw: Option<JsonStorageConfig>) -> Result<StorageConfig> {
    let raw = raw.ok_or_else(|| {
        AppError::Config("'storage' section must be present in config.json".to_string())
    })?;

    let require = |field: Option<String>, name: &str| -> Result<String> {
        field.filter(|s| !s.is_empty()).ok_or_else(|| {
            AppError::Config(format!("'storage.{}' is missing or empty in config.json", name))
        })
    };

    Ok(StorageConfig {
        endpoint: require(raw.endpoint, "endpoint")?,
        access_key: require(raw.access_key, "access_key")?,
        secret_key: require(raw.secret_key, "secret_key")?,
        bucket: require(raw.bucket, "bucket")?,
    })
}

/// Loads the cluster inventory YAML. The file must be a mapping of
/// cluster name to cluster config; anything else is a fatal load error.
pub fn load_inventory(path: &Path) -> Result<Inventory> {
    let content = fs::read_to_string(path)?;

    let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
    if !value.is_mapping() {
        return Err(AppError::Config(format!(
            "Inventory file {} must be a YAML mapping of cluster name to config",
            path.display()
        )));
    }

    let inventory: Inventory = serde_yaml::from_value(value)?;
    Ok(inventory)
}
