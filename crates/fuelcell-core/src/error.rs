use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuelCellError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream service error: {0}")]
    UpstreamService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FuelCellError {
    /// Errors caused by the caller's data rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, FuelCellError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, FuelCellError>;
