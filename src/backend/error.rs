use std::time::Duration;

use thiserror::Error;

/// Transport failures of one send attempt. None of them is retried.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("AI service requires additional credits.")]
    CreditsExhausted,

    #[error("Failed to get response")]
    Failed { status: u16 },

    #[error("Timed out after {0:?} waiting for a response")]
    RequestTimeout(Duration),

    #[error("No data received for {0:?}")]
    IdleTimeout(Duration),
}

impl BackendError {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => BackendError::RateLimited,
            402 => BackendError::CreditsExhausted,
            status => BackendError::Failed { status },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::RateLimited => Some(429),
            BackendError::CreditsExhausted => Some(402),
            BackendError::Failed { status } => Some(*status),
            _ => None,
        }
    }
}
