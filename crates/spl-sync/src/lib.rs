//! Reconciliation of upstream access records against tracked identities.
//!
//! - [`diff`] decides, purely, what changed in one batch.
//! - [`engine::Reconciler`] persists those changes and hands the resulting
//!   notifications to a dispatcher.
//! - [`scheduler::Scheduler`] drives fetch → reconcile on a fixed period,
//!   never running two cycles at once.
//! - [`delivery`] decouples notification delivery from the cycle through an
//!   in-process queue.
//! - [`supervisor::Supervisor`] restarts background tasks that panic.

pub mod delivery;
pub mod diff;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod supervisor;

pub use engine::{ReconcileReport, Reconciler};
pub use error::EngineError;
pub use scheduler::{Scheduler, TickOutcome};

#[cfg(test)]
mod fakes;
