use crate::backend::{AuthError, StoreError};
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Every failure a screen can surface to the user.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Backend(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Short text for a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Backend(StoreError::Unavailable) => {
                "You're offline. Changes will show once you reconnect.".to_string()
            }
            AppError::Backend(err) => format!("Couldn't reach the server: {}", err),
            AppError::Auth(err) => err.to_string(),
            AppError::Storage(err) => format!("Couldn't save locally: {}", err),
            AppError::Config(err) => err.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
