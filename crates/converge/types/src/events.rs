//! Event types for reconciliation observability
//!
//! Events provide a unified stream of what a reconciliation observed and did.

use crate::{EnvironmentAction, EnvironmentId, ReconciliationId, RemoteStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all reconciliation events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Reconciliation this event belongs to
    pub reconciliation_id: ReconciliationId,

    /// Event severity
    pub severity: EventSeverity,

    /// The actual event
    pub event: ReconcileEvent,
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Phase of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcilePhase {
    /// Waiting for any in-flight deployment to finish
    Drain,
    /// Waiting for a just-issued action to reach its end state
    Converge,
}

impl std::fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilePhase::Drain => write!(f, "drain"),
            ReconcilePhase::Converge => write!(f, "converge"),
        }
    }
}

/// Reconciliation events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconcileEvent {
    /// A polling phase started
    PhaseStarted {
        environment_id: EnvironmentId,
        phase: ReconcilePhase,
    },

    /// A status was fetched; `None` means the environment was not found
    StatusObserved {
        environment_id: EnvironmentId,
        phase: ReconcilePhase,
        status: Option<RemoteStatus>,
    },

    /// The remote system accepted the action
    ActionAccepted {
        environment_id: EnvironmentId,
        action: EnvironmentAction,
    },

    /// A polling phase ended, either converged or out of time
    PhaseFinished {
        environment_id: EnvironmentId,
        phase: ReconcilePhase,
        converged: bool,
        attempts: u32,
    },

    /// The reconciliation aborted with an error
    Failed {
        environment_id: EnvironmentId,
        reason: String,
    },
}

impl ReconcileEventEnvelope {
    /// Create a new event envelope
    pub fn new(event: ReconcileEvent, reconciliation_id: ReconciliationId) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            reconciliation_id,
            severity: Self::infer_severity(&event),
            event,
        }
    }

    /// Infer severity from event type
    fn infer_severity(event: &ReconcileEvent) -> EventSeverity {
        match event {
            ReconcileEvent::Failed { .. } => EventSeverity::Error,
            ReconcileEvent::PhaseFinished {
                converged: false, ..
            } => EventSeverity::Warning,
            ReconcileEvent::StatusObserved { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }
}
