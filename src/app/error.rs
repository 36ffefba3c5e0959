use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::EditError;

#[derive(Error, Debug)]
pub enum MurmurError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Response decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Request already pending for {0}")]
    RequestPending(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MurmurError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        MurmurError::Server {
            status,
            message: message.into(),
        }
    }

    /// Short message suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            MurmurError::Network(_) => "Could not reach the server".to_string(),
            MurmurError::Server { message, .. } if !message.is_empty() => message.clone(),
            MurmurError::Server { status, .. } => format!("Server returned {}", status),
            other => other.to_string(),
        }
    }
}

impl From<EditError> for MurmurError {
    fn from(err: EditError) -> Self {
        MurmurError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MurmurError>;
