use thiserror::Error;

/// Host 统一错误类型
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Contract not found: {0}")]
    NotFound(String),

    #[error("Contract must export '{0}'")]
    MissingExport(String),

    #[error("Failed to instantiate contract: {0}")]
    Instantiate(String),

    #[error("Trap in '{function}': {message}")]
    Trap { function: String, message: String },

    #[error("'{0}' exceeded its epoch deadline")]
    Interrupted(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Failed to acquire lock: {0}")]
    Lock(String),

    #[error("Wasm error: {0}")]
    Wasm(String),
}

pub type Result<T> = std::result::Result<T, HostError>;

impl From<anyhow::Error> for HostError {
    fn from(err: anyhow::Error) -> Self {
        HostError::Wasm(format!("{:#}", err))
    }
}

impl HostError {
    /// Classifies an error returned from calling into the guest.
    pub fn from_call(function: &str, err: anyhow::Error) -> Self {
        match err.downcast_ref::<wasmtime::Trap>() {
            Some(wasmtime::Trap::Interrupt) => HostError::Interrupted(function.to_string()),
            _ => HostError::Trap {
                function: function.to_string(),
                message: format!("{:#}", err),
            },
        }
    }
}
