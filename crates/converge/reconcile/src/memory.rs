//! In-memory environments driven by scripted status sequences.
//!
//! Implements both [`StatusFetcher`] and [`ActionInvoker`], for tests and for
//! callers wiring a dry-run mode.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use converge_types::{ActionAck, ClientError, EnvironmentAction, EnvironmentId, RemoteStatus};
use dashmap::DashMap;

use crate::client::{ActionInvoker, StatusFetcher};

/// One scripted answer to a status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedStatus {
    /// The fetch returns this status
    Status(RemoteStatus),
    /// The environment no longer exists
    Missing,
    /// The fetch fails
    Error(ClientError),
}

impl From<&str> for ScriptedStatus {
    fn from(status: &str) -> Self {
        ScriptedStatus::Status(RemoteStatus::from(status))
    }
}

impl From<RemoteStatus> for ScriptedStatus {
    fn from(status: RemoteStatus) -> Self {
        ScriptedStatus::Status(status)
    }
}

#[derive(Default)]
struct ScriptedEnvironment {
    /// Answers consumed one per fetch; the last one repeats forever.
    pending: VecDeque<ScriptedStatus>,
    /// Scripts that replace `pending` once an action is accepted.
    on_action: HashMap<EnvironmentAction, VecDeque<ScriptedStatus>>,
    rejections: HashMap<EnvironmentAction, ClientError>,
    fetches: u32,
    actions: Vec<EnvironmentAction>,
}

/// In-memory environments
pub struct InMemoryEnvironments {
    environments: DashMap<EnvironmentId, ScriptedEnvironment>,
}

impl InMemoryEnvironments {
    pub fn new() -> Self {
        Self {
            environments: DashMap::new(),
        }
    }

    /// Set the answers returned by the next status fetches.
    pub fn script<I, S>(&self, environment_id: &EnvironmentId, statuses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ScriptedStatus>,
    {
        self.environments
            .entry(environment_id.clone())
            .or_default()
            .pending = statuses.into_iter().map(Into::into).collect();
    }

    /// Set the answers returned after `action` is accepted.
    pub fn on_action<I, S>(
        &self,
        environment_id: &EnvironmentId,
        action: EnvironmentAction,
        statuses: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<ScriptedStatus>,
    {
        self.environments
            .entry(environment_id.clone())
            .or_default()
            .on_action
            .insert(action, statuses.into_iter().map(Into::into).collect());
    }

    /// Make every status fetch fail with `error`.
    pub fn fail_fetches(&self, environment_id: &EnvironmentId, error: ClientError) {
        self.script(environment_id, [ScriptedStatus::Error(error)]);
    }

    /// Make `action` fail with `error` instead of being accepted.
    pub fn reject_action(
        &self,
        environment_id: &EnvironmentId,
        action: EnvironmentAction,
        error: ClientError,
    ) {
        self.environments
            .entry(environment_id.clone())
            .or_default()
            .rejections
            .insert(action, error);
    }

    /// Number of status fetches served for an environment
    pub fn fetch_count(&self, environment_id: &EnvironmentId) -> u32 {
        self.environments
            .get(environment_id)
            .map(|env| env.fetches)
            .unwrap_or(0)
    }

    /// Actions invoked on an environment, in order, including rejected ones
    pub fn invoked_actions(&self, environment_id: &EnvironmentId) -> Vec<EnvironmentAction> {
        self.environments
            .get(environment_id)
            .map(|env| env.actions.clone())
            .unwrap_or_default()
    }

    fn accept(
        &self,
        action: EnvironmentAction,
        environment_id: &EnvironmentId,
    ) -> Result<ActionAck, ClientError> {
        let mut env = self
            .environments
            .get_mut(environment_id)
            .ok_or_else(|| ClientError::NotFound(environment_id.to_string()))?;

        env.actions.push(action);
        if let Some(err) = env.rejections.get(&action) {
            return Err(err.clone());
        }

        let mut ack = ActionAck::new(action, environment_id.clone());
        if let Some(script) = env.on_action.remove(&action) {
            if let Some(ScriptedStatus::Status(status)) = script.front() {
                ack = ack.with_status(status.clone());
            }
            env.pending = script;
        }

        Ok(ack)
    }
}

impl Default for InMemoryEnvironments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusFetcher for InMemoryEnvironments {
    async fn get_status(
        &self,
        environment_id: &EnvironmentId,
    ) -> Result<RemoteStatus, ClientError> {
        let not_found = || ClientError::NotFound(environment_id.to_string());

        let mut env = self.environments.get_mut(environment_id).ok_or_else(not_found)?;
        env.fetches += 1;

        let next = if env.pending.len() > 1 {
            env.pending.pop_front()
        } else {
            env.pending.front().cloned()
        };

        match next {
            Some(ScriptedStatus::Status(status)) => Ok(status),
            Some(ScriptedStatus::Error(err)) => Err(err),
            Some(ScriptedStatus::Missing) | None => Err(not_found()),
        }
    }
}

#[async_trait]
impl ActionInvoker for InMemoryEnvironments {
    async fn deploy(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError> {
        self.accept(EnvironmentAction::Deploy, environment_id)
    }

    async fn stop(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError> {
        self.accept(EnvironmentAction::Stop, environment_id)
    }

    async fn restart(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError> {
        self.accept(EnvironmentAction::Restart, environment_id)
    }

    async fn delete(&self, environment_id: &EnvironmentId) -> Result<ActionAck, ClientError> {
        self.accept(EnvironmentAction::Delete, environment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_scripted_status_repeats() {
        let environments = InMemoryEnvironments::new();
        let env = EnvironmentId::new("env-1");
        environments.script(&env, ["BUILDING", "DEPLOYED"]);

        assert_eq!(environments.get_status(&env).await.unwrap().as_str(), "BUILDING");
        assert_eq!(environments.get_status(&env).await.unwrap().as_str(), "DEPLOYED");
        assert_eq!(environments.get_status(&env).await.unwrap().as_str(), "DEPLOYED");
        assert_eq!(environments.fetch_count(&env), 3);
    }

    #[tokio::test]
    async fn test_unknown_environment_is_not_found() {
        let environments = InMemoryEnvironments::new();
        let err = environments
            .get_status(&EnvironmentId::new("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_action_switches_script() {
        let environments = InMemoryEnvironments::new();
        let env = EnvironmentId::new("env-1");
        environments.script(&env, ["DEPLOYED"]);
        environments.on_action(&env, EnvironmentAction::Stop, ["STOPPING", "STOPPED"]);

        let ack = environments.invoke(EnvironmentAction::Stop, &env).await.unwrap();
        assert_eq!(ack.action, EnvironmentAction::Stop);
        assert_eq!(ack.status.as_ref().map(|s| s.as_str()), Some("STOPPING"));

        assert_eq!(environments.get_status(&env).await.unwrap().as_str(), "STOPPING");
        assert_eq!(environments.get_status(&env).await.unwrap().as_str(), "STOPPED");
        assert_eq!(environments.invoked_actions(&env), vec![EnvironmentAction::Stop]);
    }

    #[tokio::test]
    async fn test_rejected_action_is_recorded() {
        let environments = InMemoryEnvironments::new();
        let env = EnvironmentId::new("env-1");
        environments.script(&env, ["DEPLOYED"]);
        environments.reject_action(
            &env,
            EnvironmentAction::Restart,
            ClientError::from_status(409, "conflict"),
        );

        assert!(environments.restart(&env).await.is_err());
        assert_eq!(environments.invoked_actions(&env), vec![EnvironmentAction::Restart]);
    }

    #[tokio::test]
    async fn test_missing_after_delete() {
        let environments = InMemoryEnvironments::new();
        let env = EnvironmentId::new("env-1");
        environments.script(&env, ["STOPPED"]);
        environments.on_action(
            &env,
            EnvironmentAction::Delete,
            [ScriptedStatus::from("DELETING"), ScriptedStatus::Missing],
        );

        environments.delete(&env).await.unwrap();
        assert!(environments.get_status(&env).await.is_ok());
        assert!(environments.get_status(&env).await.unwrap_err().is_not_found());
    }
}
