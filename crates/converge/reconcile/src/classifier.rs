//! Remote status classification.
//!
//! Decides from a raw status string whether to keep polling. The two
//! variants differ in which statuses they consider terminal and in how
//! they treat error statuses, so the tables below are kept separate even
//! where they overlap.

use std::fmt;

use converge_types::{ClientError, DesiredState, EnvironmentId, RemoteStatus};

use crate::error::{ReconcileError, Result};

/// Strategy for deciding whether the remote system has reached the state
/// being waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClassifier {
    /// Waiting for a previous deployment to settle before starting a new one.
    /// Any terminal status counts, successful or not.
    PreDeploy,

    /// Waiting for a just-issued action to reach the given state.
    PostAction(DesiredState),
}

impl StatusClassifier {
    /// Classify a fetched status.
    ///
    /// `Ok(true)` means done, `Ok(false)` means keep polling, and an error
    /// means stop polling and report it.
    pub fn classify(&self, status: &RemoteStatus) -> Result<bool> {
        match self {
            StatusClassifier::PreDeploy => classify_pre_deploy(status),
            StatusClassifier::PostAction(desired) => classify_post_action(status, *desired),
        }
    }

    /// Classify the result of a status fetch, including fetch failures.
    ///
    /// A missing environment is the expected end state of a delete; every
    /// other fetch failure is fatal.
    pub fn classify_fetch(
        &self,
        environment_id: &EnvironmentId,
        fetched: std::result::Result<RemoteStatus, ClientError>,
    ) -> Result<bool> {
        match fetched {
            Ok(status) => self.classify(&status),
            Err(err)
                if err.is_not_found()
                    && *self == StatusClassifier::PostAction(DesiredState::Deleted) =>
            {
                Ok(true)
            }
            Err(source) => Err(ReconcileError::Client {
                environment_id: environment_id.clone(),
                source,
            }),
        }
    }

    /// Human readable description of what is being waited for.
    pub fn describe(&self) -> String {
        match self {
            StatusClassifier::PreDeploy => "waiting for previous deployment".to_string(),
            StatusClassifier::PostAction(desired) => format!("waiting for {}", desired),
        }
    }
}

impl fmt::Display for StatusClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn classify_pre_deploy(status: &RemoteStatus) -> Result<bool> {
    match status.as_str() {
        "BUILDING" | "QUEUED" | "DEPLOYING" | "STOPPING" | "RESTARTING" | "CANCELING"
        | "DELETING" | "DEPLOYMENT_QUEUED" | "STOP_QUEUED" | "RESTART_QUEUED"
        | "DELETE_QUEUED" => Ok(false),

        "READY" | "DEPLOYED" | "STOPPED" | "DELETED" | "RESTARTED" | "CANCELED"
        | "BUILD_ERROR" | "DEPLOYMENT_ERROR" | "STOP_ERROR" | "RESTART_ERROR"
        | "DELETE_ERROR" => Ok(true),

        _ => Err(ReconcileError::UnexpectedStatus {
            status: status.clone(),
            classifier: StatusClassifier::PreDeploy,
        }),
    }
}

fn classify_post_action(status: &RemoteStatus, desired: DesiredState) -> Result<bool> {
    match status.as_str() {
        "READY" | "QUEUED" | "DEPLOYMENT_QUEUED" | "STOP_QUEUED" | "RESTART_QUEUED"
        | "DELETE_QUEUED" | "BUILDING" | "DEPLOYING" | "STOPPING" | "RESTARTING"
        | "DELETING" | "CANCELING" => Ok(false),

        "BUILD_ERROR" | "DEPLOYMENT_ERROR" | "DELETE_ERROR" | "STOP_ERROR"
        | "RESTART_ERROR" => Err(ReconcileError::TerminalFailure {
            status: status.clone(),
            desired,
        }),

        // Success regardless of the desired state; CANCELED counts as done.
        "STOPPED" | "DEPLOYED" | "DELETED" | "RESTARTED" | "CANCELED" => Ok(true),

        _ => Err(ReconcileError::UnexpectedStatus {
            status: status.clone(),
            classifier: StatusClassifier::PostAction(desired),
        }),
    }
}
