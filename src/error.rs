#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OAuth protocol error: {0}")]
    Protocol(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid authorization callback: {0}")]
    InvalidCallback(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
