//! Observability helpers for reconciles.
//!
//! Every reconcile runs inside an `access_token_operator.reconcile` span carrying the
//! `controller` and `key` fields.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment the `access_token_operator_reconcile_total` counter for every
//!   attempt/success/requeue/failure, labeled by `controller` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Controllers run by the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerKind {
	/// Access token phase state machine.
	AccessToken,
	/// Binding resolution.
	Binding,
	/// Storage-change trigger consumption.
	DataUpdate,
}
impl ControllerKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ControllerKind::AccessToken => "access_token",
			ControllerKind::Binding => "binding",
			ControllerKind::DataUpdate => "data_update",
		}
	}
}
impl Display for ControllerKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each reconcile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReconcileOutcome {
	/// A worker picked the key up.
	Attempt,
	/// Finished without a requested requeue.
	Success,
	/// Finished and asked to run again later.
	Requeue,
	/// Failed and was re-queued with backoff.
	Failure,
}
impl ReconcileOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ReconcileOutcome::Attempt => "attempt",
			ReconcileOutcome::Success => "success",
			ReconcileOutcome::Requeue => "requeue",
			ReconcileOutcome::Failure => "failure",
		}
	}
}
impl Display for ReconcileOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
