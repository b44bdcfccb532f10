//! Seams to the remote environment API.
//!
//! The reconciliation engine never talks to the remote system directly; it
//! goes through these traits so the generated REST client, a dry-run mode or
//! a test double can be plugged in.

use async_trait::async_trait;
use converge_types::{ActionAck, ClientError, EnvironmentAction, EnvironmentId, RemoteStatus};

/// Fetches the current status of an environment
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Get the current status.
    ///
    /// Must return [`ClientError::NotFound`] when the environment does not
    /// exist, so deletes can be recognised as complete.
    async fn get_status(
        &self,
        environment_id: &EnvironmentId,
    ) -> Result<RemoteStatus, ClientError>;
}

/// Issues actions against an environment
///
/// Every call is fire-and-forget: success means the remote system accepted
/// the action, not that it finished.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn deploy(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError>;

    async fn stop(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError>;

    async fn restart(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError>;

    async fn delete(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError>;

    /// Dispatch to the method matching `action`
    async fn invoke(
        &self,
        action: EnvironmentAction,
        environment_id: &EnvironmentId,
    ) -> Result<ActionAck, ClientError> {
        match action {
            EnvironmentAction::Deploy => self.deploy(environment_id).await,
            EnvironmentAction::Stop => self.stop(environment_id).await,
            EnvironmentAction::Restart => self.restart(environment_id).await,
            EnvironmentAction::Delete => self.delete(environment_id).await,
        }
    }
}
