//! Timer-driven preemptive refresh, reducing reactive 401 handling.

// crates.io
use tokio::{task::JoinHandle, time};
// self
use crate::{
	_prelude::*,
	http::RefreshTransport,
	obs::{self, FlowKind, FlowOutcome},
	refresh::RefreshCoordinator,
	session::SessionStore,
};

/// Periodically refreshes the token before natural expiry.
///
/// Owned by the UI shell rather than the core: it merely consumes the
/// coordinator. Each tick checks the idle state before invoking so it never
/// contends with a reactive refresh already in progress, though the
/// coordinator's single-flight logic would tolerate the race regardless.
pub struct PreemptiveRefreshScheduler<T>
where
	T: ?Sized + RefreshTransport,
{
	session: Arc<SessionStore>,
	coordinator: Arc<RefreshCoordinator<T>>,
	period: Duration,
}
impl<T> PreemptiveRefreshScheduler<T>
where
	T: ?Sized + RefreshTransport,
{
	/// Creates a scheduler polling at the provided period.
	pub fn new(
		session: Arc<SessionStore>,
		coordinator: Arc<RefreshCoordinator<T>>,
		period: Duration,
	) -> Self {
		Self { session, coordinator, period }
	}

	/// Runs the poll loop forever. The first check happens one full period in.
	pub async fn run(self) {
		let mut ticker = time::interval_at(time::Instant::now() + self.period, self.period);

		ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

		loop {
			ticker.tick().await;
			self.poll_once(OffsetDateTime::now_utc()).await;
		}
	}

	/// Performs a single preemptive check, refreshing when the token is stale
	/// and the coordinator is idle.
	pub async fn poll_once(&self, now: OffsetDateTime) {
		if !self.session.should_preemptively_refresh(now) || !self.coordinator.is_idle() {
			return;
		}

		obs::record_flow_outcome(FlowKind::Preemptive, FlowOutcome::Attempt);

		// A terminal outcome already tore the session down; nothing to escalate here.
		match self.coordinator.ensure_fresh_token().await {
			Ok(_) => obs::record_flow_outcome(FlowKind::Preemptive, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(FlowKind::Preemptive, FlowOutcome::Failure),
		}
	}

	/// Spawns [`run`](Self::run) onto the current runtime.
	pub fn spawn(self) -> JoinHandle<()> {
		tokio::spawn(self.run())
	}
}
impl<T> Debug for PreemptiveRefreshScheduler<T>
where
	T: ?Sized + RefreshTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PreemptiveRefreshScheduler").field("period", &self.period).finish()
	}
}
