//! Deployment types for environment reconciliation
//!
//! A Deployment exists only for the duration of one reconciliation call. It
//! has no persisted lifecycle of its own.

use crate::{EnvironmentId, ReconciliationId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// End state the caller waits for after issuing an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesiredState {
    Deployed,
    Stopped,
    Restarted,
    Deleted,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Deployed => write!(f, "DEPLOYED"),
            DesiredState::Stopped => write!(f, "STOPPED"),
            DesiredState::Restarted => write!(f, "RESTARTED"),
            DesiredState::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Action that can be issued against a remote environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentAction {
    Deploy,
    Stop,
    Restart,
    Delete,
}

impl EnvironmentAction {
    /// The state a successful run of this action ends in
    pub fn desired_state(&self) -> DesiredState {
        match self {
            EnvironmentAction::Deploy => DesiredState::Deployed,
            EnvironmentAction::Stop => DesiredState::Stopped,
            EnvironmentAction::Restart => DesiredState::Restarted,
            EnvironmentAction::Delete => DesiredState::Deleted,
        }
    }
}

impl fmt::Display for EnvironmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentAction::Deploy => write!(f, "deploy"),
            EnvironmentAction::Stop => write!(f, "stop"),
            EnvironmentAction::Restart => write!(f, "restart"),
            EnvironmentAction::Delete => write!(f, "delete"),
        }
    }
}

/// Raw status string reported by the remote system
///
/// Deliberately not an enum: the remote vocabulary evolves independently and
/// classification is where unknown values are detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteStatus(String);

impl RemoteStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteStatus {
    fn from(status: &str) -> Self {
        Self::new(status)
    }
}

impl From<String> for RemoteStatus {
    fn from(status: String) -> Self {
        Self(status)
    }
}

/// One reconciliation: an environment bound to the state we expect it to reach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Correlation identifier for this reconciliation
    pub reconciliation_id: ReconciliationId,

    /// Environment being acted upon
    pub environment_id: EnvironmentId,

    /// Target end state, fixed for the whole reconciliation
    pub desired_state: DesiredState,

    /// Created timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Deployment {
    pub fn new(environment_id: EnvironmentId, desired_state: DesiredState) -> Self {
        Self {
            reconciliation_id: ReconciliationId::generate(),
            environment_id,
            desired_state,
            created_at: chrono::Utc::now(),
        }
    }

    /// Create the deployment an action is expected to produce
    pub fn for_action(environment_id: EnvironmentId, action: EnvironmentAction) -> Self {
        Self::new(environment_id, action.desired_state())
    }
}

/// Acknowledgement returned by the remote system when it accepts an action
///
/// Acceptance only; the action completes asynchronously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    pub action: EnvironmentAction,
    pub environment_id: EnvironmentId,
    /// Status echoed in the acknowledgement, if the remote API returned one
    pub status: Option<RemoteStatus>,
}

impl ActionAck {
    pub fn new(action: EnvironmentAction, environment_id: EnvironmentId) -> Self {
        Self {
            action,
            environment_id,
            status: None,
        }
    }

    pub fn with_status(mut self, status: RemoteStatus) -> Self {
        self.status = Some(status);
        self
    }
}
