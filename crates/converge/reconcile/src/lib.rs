//! Converge Reconciliation Engine
//!
//! Blocks a caller until a remote environment reaches the terminal state an
//! action asked for. The remote system is asynchronous and is only observed
//! by polling its status.
//!
//! ## Architectural Boundaries
//!
//! - The generated REST client owns: wire format, authentication, field mapping
//! - `converge-reconcile` owns: polling cadence and status interpretation
//!
//! The remote system is reached only through [`StatusFetcher`] and
//! [`ActionInvoker`].
//!
//! ## Usage
//!
//! ```no_run
//! use converge_reconcile::{DeploymentOrchestrator, InMemoryEnvironments, PollConfig};
//! use converge_types::EnvironmentId;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let environments = Arc::new(InMemoryEnvironments::new());
//! let orchestrator = DeploymentOrchestrator::new(
//!     environments.clone(),
//!     environments,
//!     PollConfig::default(),
//! );
//!
//! let report = orchestrator
//!     .deploy(&EnvironmentId::new("env-1"), &CancellationToken::new())
//!     .await?;
//!
//! // A timed-out wait is not an error.
//! if !report.is_converged() {
//!     println!("gave up, last status: {:?}", report.last_status);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod classifier;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod poll;
pub mod predicate;

// Re-exports
pub use classifier::StatusClassifier;
pub use client::{ActionInvoker, StatusFetcher};
pub use clock::{Tick, Ticker};
pub use config::{ConvergeConfig, PollConfig};
pub use error::{ReconcileError, Result};
pub use memory::{InMemoryEnvironments, ScriptedStatus};
pub use orchestrator::{DeploymentOrchestrator, ReconcileReport};
pub use poll::{wait, WaitOutcome};
pub use predicate::{predicate_fn, FnPredicate, Predicate, StatusPredicate};
