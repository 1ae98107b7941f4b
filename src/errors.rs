use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Velero dependency missing: {0}")]
    DependencyMissing(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to spawn `{command}`: {source}")]
    ProcessSpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Velero command `{command}` failed: {stderr}")]
    EngineExecutionFailed { command: String, stderr: String },

    #[error("Cluster '{0}' not found in inventory")]
    ClusterNotFound(String),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
