//! Single-flight refresh coordination with FIFO waiter replay and linear backoff.
//!
//! [`RefreshCoordinator::ensure_fresh_token`] is the crate's core state machine.
//! The first caller to arrive while the coordinator is idle starts the refresh
//! cycle: a detached task drives the transport with a bounded timeout and a
//! linear backoff schedule. Every caller, the first one included, parks on a
//! oneshot channel in arrival order; when the cycle settles, the queue drains
//! strictly FIFO, resolving each waiter with the new token or rejecting all of
//! them with the terminal error before the session is torn down. Because the
//! cycle does not run inside any caller's future, dropping a caller never
//! stalls settlement. For any number of concurrent callers, exactly one
//! transport call is ever outstanding.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TerminationReason},
	config::LifecycleConfig,
	error::TransportError,
	http::RefreshTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionStore,
	terminate::SessionTerminator,
};

type Waiter = oneshot::Sender<Result<AccessToken>>;

enum CoordinatorState {
	Idle,
	// Arrival order of the senders is the drain order.
	Refreshing { waiters: Vec<Waiter> },
}

/// Serializes refresh attempts so exactly one transport call is in flight.
///
/// Dependencies are constructor-injected so the single-flight invariant is
/// enforceable and testable in isolation; nothing in the crate reaches for
/// global state.
pub struct RefreshCoordinator<T>
where
	T: ?Sized + RefreshTransport,
{
	/// Shared metrics recorder for refresh outcomes.
	pub metrics: Arc<RefreshMetrics>,
	cycle: Arc<RefreshCycle<T>>,
}
impl<T> RefreshCoordinator<T>
where
	T: ?Sized + RefreshTransport,
{
	/// Creates a coordinator over the provided transport and collaborators.
	pub fn new(
		session: Arc<SessionStore>,
		transport: impl Into<Arc<T>>,
		terminator: Arc<SessionTerminator>,
		config: LifecycleConfig,
	) -> Self {
		let metrics = Arc::new(RefreshMetrics::default());

		Self {
			metrics: metrics.clone(),
			cycle: Arc::new(RefreshCycle {
				metrics,
				transport: transport.into(),
				session,
				terminator,
				config,
				state: Mutex::new(CoordinatorState::Idle),
			}),
		}
	}

	/// Returns `true` when no refresh cycle is in flight.
	pub fn is_idle(&self) -> bool {
		matches!(*self.cycle.state.lock(), CoordinatorState::Idle)
	}

	/// Returns `true` while a refresh cycle is in flight.
	pub fn is_refreshing(&self) -> bool {
		!self.is_idle()
	}

	/// Ensures a fresh token exists, joining an in-flight refresh if one is underway.
	///
	/// The returned future settles exactly once for every caller. Dropping it
	/// while parked (e.g. because the caller's own request timeout fired)
	/// removes the waiter from the queue; the cycle itself runs on a detached
	/// task, so even the caller that started it can be cancelled without
	/// leaving the queue or the state machine stuck.
	pub async fn ensure_fresh_token(&self) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "ensure_fresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.cycle
					.clone()
					.subscribe()
					.await
					.map_err(|e| Error::Transport(TransportError::network(e)))?
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
impl<T> Debug for RefreshCoordinator<T>
where
	T: ?Sized + RefreshTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator").field("idle", &self.is_idle()).finish()
	}
}

// Shared with the detached driver task, which owns settlement; callers hold
// only oneshot receivers.
struct RefreshCycle<T>
where
	T: ?Sized + RefreshTransport,
{
	metrics: Arc<RefreshMetrics>,
	transport: Arc<T>,
	session: Arc<SessionStore>,
	terminator: Arc<SessionTerminator>,
	config: LifecycleConfig,
	state: Mutex<CoordinatorState>,
}
impl<T> RefreshCycle<T>
where
	T: ?Sized + RefreshTransport,
{
	// Parks the caller in arrival order. The caller that flips the state to
	// `Refreshing` also spawns the driver task, then waits like everyone else.
	fn subscribe(self: Arc<Self>) -> oneshot::Receiver<Result<AccessToken>> {
		let (tx, rx) = oneshot::channel();
		let owns_cycle = {
			let mut state = self.state.lock();

			match &mut *state {
				CoordinatorState::Idle => {
					*state = CoordinatorState::Refreshing { waiters: vec![tx] };

					true
				},
				CoordinatorState::Refreshing { waiters } => {
					waiters.push(tx);

					false
				},
			}
		};

		if owns_cycle {
			tokio::spawn(async move {
				self.session.mark_refresh_attempt(OffsetDateTime::now_utc());

				let outcome = self.run_attempts().await;

				self.settle(outcome);
			});
		}

		rx
	}

	// Attempts are strictly sequential and never overlap; only the driver task
	// runs this.
	async fn run_attempts(&self) -> Result<AccessToken, TerminationReason> {
		let attempts = self.config.retry_attempts.max(1);

		for attempt in 1..=attempts {
			self.metrics.record_attempt();

			let result =
				tokio::time::timeout(self.config.refresh_timeout, self.transport.refresh()).await;

			match result {
				Ok(Ok(token)) => return Ok(token),
				Ok(Err(err)) if !err.is_transient() => {
					obs::record_refresh_denied(&err);

					return Err(TerminationReason::RefreshTokenExpired);
				},
				Ok(Err(err)) => obs::record_refresh_transient(&err, attempt),
				Err(_elapsed) => obs::record_refresh_timeout(attempt),
			}

			if attempt < attempts {
				tokio::time::sleep(backoff_delay(self.config.retry_base_delay, attempt)).await;
			}
		}

		Err(TerminationReason::RefreshUnreachable)
	}

	fn settle(&self, outcome: Result<AccessToken, TerminationReason>) {
		match outcome {
			Ok(token) => {
				// Install the token before draining so replays read the new value.
				if let Err(err) = self.session.set_token(token.clone()) {
					obs::record_vault_failure(&err);
				}

				for waiter in self.take_waiters() {
					let _ = waiter.send(Ok(token.clone()));
				}

				self.metrics.record_success();
			},
			Err(reason) => {
				for waiter in self.take_waiters() {
					let _ = waiter.send(Err(Error::SessionTerminated { reason }));
				}

				self.terminator.terminate(reason);
				self.metrics.record_terminal(reason);
			},
		}
	}

	fn take_waiters(&self) -> Vec<Waiter> {
		let mut state = self.state.lock();

		match std::mem::replace(&mut *state, CoordinatorState::Idle) {
			CoordinatorState::Refreshing { waiters } => waiters,
			CoordinatorState::Idle => Vec::new(),
		}
	}
}

// Linear, not exponential: the wait before retry `n` is `base * n`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
	base.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn backoff_schedule_is_linear() {
		let base = Duration::from_millis(1_000);

		assert_eq!(backoff_delay(base, 1), Duration::from_millis(1_000));
		assert_eq!(backoff_delay(base, 2), Duration::from_millis(2_000));
		assert_eq!(backoff_delay(base, 3), Duration::from_millis(3_000));
	}
}
