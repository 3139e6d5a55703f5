//! Optional observability helpers for the token lifecycle.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_warden.flow` with the `flow` and
//!   `stage` fields, plus warn/info events at the refresh decision points.
//! - Enable `metrics` to increment the `token_warden_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::TerminationReason, error::RefreshError, store::VaultError};

/// Lifecycle flows observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Single-flight refresh cycle.
	Refresh,
	/// Protected call through the authenticated client.
	Protected,
	/// Timer-driven preemptive refresh.
	Preemptive,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Refresh => "refresh",
			FlowKind::Protected => "protected",
			FlowKind::Preemptive => "preemptive",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a lifecycle helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

pub(crate) fn record_vault_failure(err: &VaultError) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(error = %err, "Token vault operation failed; in-memory session state stands.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

pub(crate) fn record_refresh_denied(err: &RefreshError) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(error = %err, "Refresh endpoint rejected the credential; terminating session.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

pub(crate) fn record_refresh_transient(err: &RefreshError, attempt: u32) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(error = %err, attempt, "Transient refresh failure.");
	#[cfg(not(feature = "tracing"))]
	let _ = (err, attempt);
}

pub(crate) fn record_refresh_timeout(attempt: u32) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(attempt, "Refresh transport call exceeded its deadline.");
	#[cfg(not(feature = "tracing"))]
	let _ = attempt;
}

pub(crate) fn record_termination(reason: TerminationReason) {
	#[cfg(feature = "tracing")]
	::tracing::info!(reason = reason.as_str(), "Session terminated.");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}
