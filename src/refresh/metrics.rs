// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::auth::TerminationReason;

/// Thread-safe counters for refresh transport activity.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	expired_terminals: AtomicU64,
	unreachable_terminals: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of transport attempts, retries included.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh cycles that settled with a new token.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles terminated by credential expiry.
	pub fn expired_terminals(&self) -> u64 {
		self.expired_terminals.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles terminated by exhausted retries.
	pub fn unreachable_terminals(&self) -> u64 {
		self.unreachable_terminals.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_terminal(&self, reason: TerminationReason) {
		match reason {
			TerminationReason::RefreshTokenExpired => {
				self.expired_terminals.fetch_add(1, Ordering::Relaxed);
			},
			TerminationReason::RefreshUnreachable => {
				self.unreachable_terminals.fetch_add(1, Ordering::Relaxed);
			},
		}
	}
}
