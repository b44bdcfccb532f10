//! Reconciliation error types

use converge_types::{ClientError, DesiredState, EnvironmentAction, EnvironmentId, RemoteStatus};
use thiserror::Error;

use crate::classifier::StatusClassifier;

/// Reconciliation errors
///
/// Running out of time is not an error; see [`crate::poll::WaitOutcome`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to fetch status of environment {environment_id}: {source}")]
    Client {
        environment_id: EnvironmentId,
        #[source]
        source: ClientError,
    },

    #[error("Environment reached failed status {status} while waiting for {desired}")]
    TerminalFailure {
        status: RemoteStatus,
        desired: DesiredState,
    },

    #[error("Unexpected environment status {status} while {classifier}")]
    UnexpectedStatus {
        status: RemoteStatus,
        classifier: StatusClassifier,
    },

    #[error("Failed to {action} environment {environment_id}: {source}")]
    Action {
        action: EnvironmentAction,
        environment_id: EnvironmentId,
        #[source]
        source: ClientError,
    },

    #[error("Reconciliation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReconcileError {
    /// The raw remote status carried by this error, if any
    pub fn status(&self) -> Option<&RemoteStatus> {
        match self {
            ReconcileError::TerminalFailure { status, .. }
            | ReconcileError::UnexpectedStatus { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
