//! Deployment Orchestrator - Drain, invoke, converge
//!
//! The orchestrator is the main entry point for reconciliation. For every
//! action it first waits for any in-flight deployment to settle, then issues
//! the action, then waits for the environment to reach the state the action
//! asked for. The three steps never overlap.

use std::sync::Arc;

use converge_types::{
    ActionAck, Deployment, EnvironmentAction, EnvironmentId, ReconcileEvent,
    ReconcileEventEnvelope, ReconcilePhase, ReconciliationId, RemoteStatus,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::classifier::StatusClassifier;
use crate::client::{ActionInvoker, StatusFetcher};
use crate::config::PollConfig;
use crate::error::{ReconcileError, Result};
use crate::poll::{self, WaitOutcome};
use crate::predicate::{PhaseEvents, StatusPredicate};

/// Outcome of one reconciliation
///
/// A timed-out wait is reported here, not as an error: check
/// [`ReconcileReport::is_converged`] before assuming the environment reached
/// its desired state.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub deployment: Deployment,
    pub ack: ActionAck,
    /// Wait for the previous deployment to settle
    pub drain: WaitOutcome,
    /// Wait for the desired state
    pub converge: WaitOutcome,
    /// Last status seen while converging; `None` if the environment was gone
    pub last_status: Option<RemoteStatus>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl ReconcileReport {
    pub fn is_converged(&self) -> bool {
        self.converge.is_converged()
    }
}

/// Drives environment actions to their end state
pub struct DeploymentOrchestrator {
    fetcher: Arc<dyn StatusFetcher>,
    invoker: Arc<dyn ActionInvoker>,
    config: PollConfig,
    event_tx: broadcast::Sender<ReconcileEventEnvelope>,
}

impl DeploymentOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        invoker: Arc<dyn ActionInvoker>,
        config: PollConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(1024);

        Self {
            fetcher,
            invoker,
            config,
            event_tx,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Subscribe to reconciliation events
    pub fn subscribe(&self) -> broadcast::Receiver<ReconcileEventEnvelope> {
        self.event_tx.subscribe()
    }

    pub async fn deploy(
        &self,
        environment_id: &EnvironmentId,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        self.reconcile(environment_id, EnvironmentAction::Deploy, cancel)
            .await
    }

    pub async fn stop(
        &self,
        environment_id: &EnvironmentId,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        self.reconcile(environment_id, EnvironmentAction::Stop, cancel)
            .await
    }

    pub async fn restart(
        &self,
        environment_id: &EnvironmentId,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        self.reconcile(environment_id, EnvironmentAction::Restart, cancel)
            .await
    }

    pub async fn delete(
        &self,
        environment_id: &EnvironmentId,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        self.reconcile(environment_id, EnvironmentAction::Delete, cancel)
            .await
    }

    /// Drain, issue `action`, then wait for its desired state
    #[instrument(skip(self, cancel), fields(environment_id = %environment_id, action = %action))]
    pub async fn reconcile(
        &self,
        environment_id: &EnvironmentId,
        action: EnvironmentAction,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        let deployment = Deployment::for_action(environment_id.clone(), action);

        let result = self.run(deployment.clone(), action, cancel).await;
        if let Err(e) = &result {
            warn!(
                reconciliation_id = %deployment.reconciliation_id,
                error = %e,
                "Reconciliation failed"
            );
            self.emit(
                deployment.reconciliation_id,
                ReconcileEvent::Failed {
                    environment_id: environment_id.clone(),
                    reason: e.to_string(),
                },
            );
        }

        result
    }

    async fn run(
        &self,
        deployment: Deployment,
        action: EnvironmentAction,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        let environment_id = &deployment.environment_id;

        // 1. Drain
        let drain = self
            .wait_for_previous_deployment(environment_id, deployment.reconciliation_id, cancel)
            .await?;

        if !drain.is_converged() {
            warn!(
                environment_id = %environment_id,
                attempts = drain.attempts(),
                "Previous deployment did not settle in time; issuing action anyway"
            );
        }

        // 2. Invoke
        let ack = self
            .invoker
            .invoke(action, environment_id)
            .await
            .map_err(|source| ReconcileError::Action {
                action,
                environment_id: environment_id.clone(),
                source,
            })?;

        info!(
            environment_id = %environment_id,
            action = %action,
            ack_status = ?ack.status,
            "Action accepted"
        );
        self.emit(
            deployment.reconciliation_id,
            ReconcileEvent::ActionAccepted {
                environment_id: environment_id.clone(),
                action,
            },
        );

        // 3. Converge
        let (converge, last_status) = self.wait_for_desired_state(&deployment, cancel).await?;

        if converge.is_converged() {
            info!(
                environment_id = %environment_id,
                desired_state = %deployment.desired_state,
                attempts = converge.attempts(),
                "Environment reached desired state"
            );
        } else {
            warn!(
                environment_id = %environment_id,
                desired_state = %deployment.desired_state,
                last_status = ?last_status,
                "Gave up waiting for desired state"
            );
        }

        Ok(ReconcileReport {
            deployment,
            ack,
            drain,
            converge,
            last_status,
            finished_at: chrono::Utc::now(),
        })
    }

    /// Wait until no deployment is in flight on the environment.
    ///
    /// Terminal statuses count regardless of whether the previous deployment
    /// succeeded.
    pub async fn wait_for_previous_deployment(
        &self,
        environment_id: &EnvironmentId,
        reconciliation_id: ReconciliationId,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let (outcome, _) = self
            .poll_phase(
                environment_id,
                reconciliation_id,
                ReconcilePhase::Drain,
                StatusClassifier::PreDeploy,
                cancel,
            )
            .await?;
        Ok(outcome)
    }

    /// Wait until the environment reaches the deployment's desired state.
    ///
    /// Sleeps the configured initial delay first, so a just-accepted action
    /// is not mistaken for an already settled state.
    pub async fn wait_for_desired_state(
        &self,
        deployment: &Deployment,
        cancel: &CancellationToken,
    ) -> Result<(WaitOutcome, Option<RemoteStatus>)> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReconcileError::Cancelled),
            _ = tokio::time::sleep(self.config.initial_delay()) => {}
        }

        self.poll_phase(
            &deployment.environment_id,
            deployment.reconciliation_id,
            ReconcilePhase::Converge,
            StatusClassifier::PostAction(deployment.desired_state),
            cancel,
        )
        .await
    }

    async fn poll_phase(
        &self,
        environment_id: &EnvironmentId,
        reconciliation_id: ReconciliationId,
        phase: ReconcilePhase,
        classifier: StatusClassifier,
        cancel: &CancellationToken,
    ) -> Result<(WaitOutcome, Option<RemoteStatus>)> {
        info!(environment_id = %environment_id, phase = %phase, "Polling environment status");
        self.emit(
            reconciliation_id,
            ReconcileEvent::PhaseStarted {
                environment_id: environment_id.clone(),
                phase,
            },
        );

        let mut predicate =
            StatusPredicate::new(self.fetcher.clone(), environment_id.clone(), classifier)
                .with_events(PhaseEvents {
                    tx: self.event_tx.clone(),
                    reconciliation_id,
                    phase,
                });

        let outcome = poll::wait(&mut predicate, &self.config, cancel).await?;

        self.emit(
            reconciliation_id,
            ReconcileEvent::PhaseFinished {
                environment_id: environment_id.clone(),
                phase,
                converged: outcome.is_converged(),
                attempts: outcome.attempts(),
            },
        );

        Ok((outcome, predicate.into_last_status()))
    }

    fn emit(&self, reconciliation_id: ReconciliationId, event: ReconcileEvent) {
        let _ = self
            .event_tx
            .send(ReconcileEventEnvelope::new(event, reconciliation_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEnvironments;

    #[tokio::test(start_paused = true)]
    async fn test_stop_reconciles() {
        let environments = Arc::new(InMemoryEnvironments::new());
        let env = EnvironmentId::new("env-1");
        environments.script(&env, ["DEPLOYED"]);
        environments.on_action(&env, EnvironmentAction::Stop, ["STOPPING", "STOPPED"]);

        let orchestrator = DeploymentOrchestrator::new(
            environments.clone(),
            environments.clone(),
            PollConfig::default(),
        );

        let report = orchestrator
            .stop(&env, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_converged());
        assert_eq!(report.drain.attempts(), 1);
        assert_eq!(report.converge.attempts(), 2);
        assert_eq!(report.last_status.map(|s| s.to_string()), Some("STOPPED".to_string()));
        assert_eq!(environments.invoked_actions(&env), vec![EnvironmentAction::Stop]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_phase_order() {
        let environments = Arc::new(InMemoryEnvironments::new());
        let env = EnvironmentId::new("env-1");
        environments.script(&env, ["STOPPED"]);
        environments.on_action(&env, EnvironmentAction::Deploy, ["DEPLOYED"]);

        let orchestrator = DeploymentOrchestrator::new(
            environments.clone(),
            environments.clone(),
            PollConfig::default(),
        );
        let mut events = orchestrator.subscribe();

        orchestrator
            .deploy(&env, &CancellationToken::new())
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(envelope) = events.try_recv() {
            kinds.push(match envelope.event {
                ReconcileEvent::PhaseStarted { phase, .. } => format!("start:{phase}"),
                ReconcileEvent::StatusObserved { status, .. } => {
                    format!("status:{}", status.map(|s| s.to_string()).unwrap_or_default())
                }
                ReconcileEvent::ActionAccepted { action, .. } => format!("action:{action}"),
                ReconcileEvent::PhaseFinished { phase, .. } => format!("finish:{phase}"),
                ReconcileEvent::Failed { .. } => "failed".to_string(),
            });
        }

        assert_eq!(
            kinds,
            vec![
                "start:drain",
                "status:STOPPED",
                "finish:drain",
                "action:deploy",
                "start:converge",
                "status:DEPLOYED",
                "finish:converge",
            ]
        );
    }
}
