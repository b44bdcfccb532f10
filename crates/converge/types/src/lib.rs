//! Converge Types - Core types for environment deployment reconciliation
//!
//! Converge blocks a caller until a remote environment reaches the terminal
//! state an action asked for. The remote system is only observed by polling
//! its status, and it may already have converged before the first poll.
//!
//! ## Key Concepts
//!
//! - **EnvironmentId**: The remote environment being acted upon
//! - **DesiredState**: The end state the caller is waiting for
//! - **RemoteStatus**: The raw status string reported by the remote system
//! - **Deployment**: One reconciliation, binding an environment to a desired state
//! - **Events**: Observability stream emitted while reconciling

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod deployment;
pub mod error;
pub mod events;
pub mod ids;

// Re-export main types
pub use deployment::{ActionAck, Deployment, DesiredState, EnvironmentAction, RemoteStatus};
pub use error::ClientError;
pub use events::{EventSeverity, ReconcileEvent, ReconcileEventEnvelope, ReconcilePhase};
pub use ids::{EnvironmentId, ReconciliationId};
