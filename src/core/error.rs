use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutpostError {
    #[error("Outpost not found: {0}")]
    OutpostNotFound(String),

    #[error("Outpost already exists: {0}")]
    OutpostExists(String),

    #[error("Outpost already running: {0}")]
    AlreadyRunning(String),

    #[error("Outpost not running: {0}")]
    NotRunning(String),

    #[error("Outpost {name} does not support {operation}")]
    UnsupportedKind { name: String, operation: String },

    #[error("Collaborator failed: {0}")]
    Hook(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OutpostError>;
