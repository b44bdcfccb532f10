//! Errors reported by the remote environment API

use thiserror::Error;

/// Failure of a call to the remote environment API
///
/// `NotFound` is kept distinct so that a delete can treat the absence of
/// the environment as its expected end state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Environment not found: {0}")]
    NotFound(String),

    #[error("API error (status {status:?}): {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Build an error from an HTTP status code, mapping 404 to `NotFound`
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            ClientError::NotFound(message)
        } else {
            ClientError::Api {
                status: Some(status),
                message,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}
