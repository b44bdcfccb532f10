//! Predicates: "has the remote system reached the state I'm waiting for?"

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use converge_types::{
    EnvironmentId, ReconcileEvent, ReconcileEventEnvelope, ReconcilePhase, ReconciliationId,
    RemoteStatus,
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::classifier::StatusClassifier;
use crate::client::StatusFetcher;
use crate::error::Result;

/// A condition polled by [`crate::poll::wait`].
///
/// `Ok(true)` stops the wait successfully, `Ok(false)` keeps polling and an
/// error stops the wait with that error. Evaluation may perform network I/O.
#[async_trait]
pub trait Predicate: Send {
    async fn evaluate(&mut self) -> Result<bool>;
}

/// Predicate backed by a closure returning a future.
pub struct FnPredicate<F> {
    f: F,
}

/// Wrap a closure as a [`Predicate`].
pub fn predicate_fn<F, Fut>(f: F) -> FnPredicate<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<bool>> + Send + 'static,
{
    FnPredicate { f }
}

#[async_trait]
impl<F, Fut> Predicate for FnPredicate<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<bool>> + Send + 'static,
{
    async fn evaluate(&mut self) -> Result<bool> {
        (self.f)().await
    }
}

/// Where a status predicate reports what it observed.
pub(crate) struct PhaseEvents {
    pub(crate) tx: broadcast::Sender<ReconcileEventEnvelope>,
    pub(crate) reconciliation_id: ReconciliationId,
    pub(crate) phase: ReconcilePhase,
}

/// Fetches an environment's status and classifies it.
pub struct StatusPredicate {
    fetcher: Arc<dyn StatusFetcher>,
    environment_id: EnvironmentId,
    classifier: StatusClassifier,
    last_status: Option<RemoteStatus>,
    events: Option<PhaseEvents>,
}

impl StatusPredicate {
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        environment_id: EnvironmentId,
        classifier: StatusClassifier,
    ) -> Self {
        Self {
            fetcher,
            environment_id,
            classifier,
            last_status: None,
            events: None,
        }
    }

    pub(crate) fn with_events(mut self, events: PhaseEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Last successfully fetched status. Cleared when the environment is
    /// reported missing.
    pub fn last_status(&self) -> Option<&RemoteStatus> {
        self.last_status.as_ref()
    }

    pub fn into_last_status(self) -> Option<RemoteStatus> {
        self.last_status
    }

    fn observed(&self, status: Option<RemoteStatus>) {
        if let Some(events) = &self.events {
            let event = ReconcileEvent::StatusObserved {
                environment_id: self.environment_id.clone(),
                phase: events.phase,
                status,
            };
            let _ = events
                .tx
                .send(ReconcileEventEnvelope::new(event, events.reconciliation_id));
        }
    }
}

#[async_trait]
impl Predicate for StatusPredicate {
    async fn evaluate(&mut self) -> Result<bool> {
        let fetched = self.fetcher.get_status(&self.environment_id).await;

        match &fetched {
            Ok(status) => {
                debug!(
                    environment_id = %self.environment_id,
                    status = %status,
                    classifier = ?self.classifier,
                    "Observed environment status"
                );
                self.last_status = Some(status.clone());
                self.observed(Some(status.clone()));
            }
            Err(err) if err.is_not_found() => {
                debug!(environment_id = %self.environment_id, "Environment not found");
                self.last_status = None;
                self.observed(None);
            }
            Err(_) => {}
        }

        self.classifier.classify_fetch(&self.environment_id, fetched)
    }
}
