//! Idempotent session teardown: clear, notify once, then redirect.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{_prelude::*, auth::TerminationReason, obs, session::SessionStore};

/// Tears the session down exactly once per termination event.
///
/// Terminal refresh outcomes can reach this from several queued callers in
/// quick succession; the guard flag collapses them into a single store clear,
/// a single user notification, and a single scheduled redirect. The terminator
/// never re-enters the refresh coordinator.
pub struct SessionTerminator {
	session: Arc<SessionStore>,
	redirect_delay: Duration,
	terminated: AtomicBool,
}
impl SessionTerminator {
	/// Creates a terminator over the provided session store.
	pub fn new(session: Arc<SessionStore>, redirect_delay: Duration) -> Self {
		Self { session, redirect_delay, terminated: AtomicBool::new(false) }
	}

	/// Clears the session, emits the termination signal, and schedules the
	/// redirect to the unauthenticated entry point.
	///
	/// Calling this twice has the same effect as calling it once. On a tokio
	/// runtime the redirect is delayed so the user can read the notification
	/// first; outside any runtime (e.g. a synchronous logout path) there is no
	/// timer to wait on and the redirect fires inline. The notification wording
	/// is carried by [`TerminationReason::user_message`].
	pub fn terminate(&self, reason: TerminationReason) {
		if self.terminated.swap(true, Ordering::SeqCst) {
			return;
		}

		obs::record_termination(reason);
		self.session.clear();
		self.session.notify_session_terminated(reason);

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let session = self.session.clone();
				let delay = self.redirect_delay;

				handle.spawn(async move {
					tokio::time::sleep(delay).await;
					session.notify_redirect();
				});
			},
			Err(_) => self.session.notify_redirect(),
		}
	}

	/// Returns `true` once a termination has run.
	pub fn has_terminated(&self) -> bool {
		self.terminated.load(Ordering::SeqCst)
	}

	/// Re-arms the terminator after a successful re-authentication.
	///
	/// Login flows call this so a later expiry in the same process can tear the
	/// new session down again.
	pub fn rearm(&self) {
		self.terminated.store(false, Ordering::SeqCst);
	}
}
impl Debug for SessionTerminator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTerminator")
			.field("terminated", &self.has_terminated())
			.field("redirect_delay", &self.redirect_delay)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// self
	use super::*;
	use crate::{auth::AccessToken, session::SessionObserver};

	#[derive(Default)]
	struct CountingObserver {
		terminations: AtomicUsize,
		redirects: AtomicUsize,
	}
	impl SessionObserver for CountingObserver {
		fn token_updated(&self, _: &AccessToken) {}

		fn session_terminated(&self, _: TerminationReason) {
			self.terminations.fetch_add(1, Ordering::SeqCst);
		}

		fn redirect_to_entry(&self) {
			self.redirects.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[tokio::test]
	async fn double_terminate_notifies_once() {
		let session = Arc::new(SessionStore::in_memory());
		let observer = Arc::new(CountingObserver::default());

		session.register_observer(observer.clone());
		session
			.set_token(AccessToken::new("t1"))
			.expect("Seeding the session should succeed.");

		let terminator = SessionTerminator::new(session.clone(), Duration::from_millis(1));

		terminator.terminate(TerminationReason::RefreshTokenExpired);
		terminator.terminate(TerminationReason::RefreshUnreachable);

		assert!(terminator.has_terminated());
		assert!(!session.is_authenticated());
		assert_eq!(observer.terminations.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn terminate_outside_a_runtime_redirects_inline() {
		let session = Arc::new(SessionStore::in_memory());
		let observer = Arc::new(CountingObserver::default());

		session.register_observer(observer.clone());

		let terminator = SessionTerminator::new(session.clone(), Duration::from_millis(1));

		terminator.terminate(TerminationReason::RefreshUnreachable);

		assert!(!session.is_authenticated());
		assert_eq!(observer.terminations.load(Ordering::SeqCst), 1);
		assert_eq!(observer.redirects.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn rearm_allows_a_later_termination() {
		let session = Arc::new(SessionStore::in_memory());
		let observer = Arc::new(CountingObserver::default());

		session.register_observer(observer.clone());

		let terminator = SessionTerminator::new(session, Duration::from_millis(1));

		terminator.terminate(TerminationReason::RefreshUnreachable);
		terminator.rearm();
		terminator.terminate(TerminationReason::RefreshTokenExpired);

		assert_eq!(observer.terminations.load(Ordering::SeqCst), 2);
	}
}
