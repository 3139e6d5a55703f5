//! Process-wide session state: the current token, refresh bookkeeping, and signals.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TerminationReason},
	obs,
	store::{MemoryVault, TokenVault, VaultError},
};

/// Signals emitted to UI collaborators.
///
/// Observers are invoked synchronously on the task that caused the transition,
/// so implementations must stay cheap and non-blocking.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// A fresh token was installed (login or successful refresh).
	fn token_updated(&self, token: &AccessToken);

	/// The session was torn down terminally.
	fn session_terminated(&self, reason: TerminationReason);

	/// The post-termination redirect delay elapsed; navigate to the
	/// unauthenticated entry point.
	fn redirect_to_entry(&self) {}
}

#[derive(Debug, Default)]
struct TokenSlot {
	token: Option<AccessToken>,
	installed_at: Option<OffsetDateTime>,
}

/// Holds the one current access token plus refresh bookkeeping.
///
/// The token field is the only cross-cutting mutable shared state in the crate.
/// It is written exclusively by [`set_token`](Self::set_token) and
/// [`clear`](Self::clear), which are called only from the refresh coordinator,
/// the session terminator, and the login flow. Readers always observe a
/// fully-formed value.
pub struct SessionStore {
	vault: Arc<dyn TokenVault>,
	slot: RwLock<TokenSlot>,
	last_refresh_attempt: RwLock<Option<OffsetDateTime>>,
	preemptive_window: Duration,
	observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
}
impl SessionStore {
	/// Opens a session store over the provided vault, hydrating any persisted token.
	pub fn open(vault: Arc<dyn TokenVault>) -> Result<Self, VaultError> {
		let token = vault.load()?;
		let installed_at = token.as_ref().map(|_| OffsetDateTime::now_utc());

		Ok(Self {
			vault,
			slot: RwLock::new(TokenSlot { token, installed_at }),
			last_refresh_attempt: RwLock::new(None),
			preemptive_window: crate::config::LifecycleConfig::default().preemptive_window,
			observers: RwLock::new(Vec::new()),
		})
	}

	/// Builds a store over a fresh [`MemoryVault`], for tests and demos.
	pub fn in_memory() -> Self {
		Self {
			vault: Arc::new(MemoryVault::default()),
			slot: RwLock::new(TokenSlot::default()),
			last_refresh_attempt: RwLock::new(None),
			preemptive_window: crate::config::LifecycleConfig::default().preemptive_window,
			observers: RwLock::new(Vec::new()),
		}
	}

	/// Overrides the token-age threshold used by [`should_preemptively_refresh`](Self::should_preemptively_refresh).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = window;

		self
	}

	/// Registers an observer for the emitted session signals.
	pub fn register_observer(&self, observer: Arc<dyn SessionObserver>) {
		self.observers.write().push(observer);
	}

	/// Returns a clone of the current token, if the session is authenticated.
	pub fn token(&self) -> Option<AccessToken> {
		self.slot.read().token.clone()
	}

	/// Returns `true` when a token is present.
	pub fn is_authenticated(&self) -> bool {
		self.slot.read().token.is_some()
	}

	/// Atomically replaces the current token and persists it to the vault.
	///
	/// Used on login and on every successful refresh. The in-memory replacement
	/// always takes effect; a vault failure is returned so callers can decide
	/// whether persistence is fatal in their context.
	pub fn set_token(&self, token: AccessToken) -> Result<(), VaultError> {
		{
			let mut slot = self.slot.write();

			slot.token = Some(token.clone());
			slot.installed_at = Some(OffsetDateTime::now_utc());
		}

		self.notify_token_updated(&token);
		self.vault.persist(&token)
	}

	/// Clears the token from memory and from the vault.
	///
	/// Used on logout and on terminal refresh failure. Vault failures are
	/// recorded through the observability hooks; the in-memory state is cleared
	/// regardless so the process never keeps using a token the backend rejected.
	pub fn clear(&self) {
		{
			let mut slot = self.slot.write();

			slot.token = None;
			slot.installed_at = None;
		}

		if let Err(err) = self.vault.clear() {
			obs::record_vault_failure(&err);
		}
	}

	/// Records the instant a refresh attempt started.
	pub fn mark_refresh_attempt(&self, instant: OffsetDateTime) {
		*self.last_refresh_attempt.write() = Some(instant);
	}

	/// Returns the instant of the most recent refresh attempt, if any.
	pub fn last_refresh_attempt(&self) -> Option<OffsetDateTime> {
		*self.last_refresh_attempt.read()
	}

	/// Returns `true` when the token's age has crossed the preemptive window.
	///
	/// The token is opaque, so freshness is measured from the instant it was
	/// installed rather than from a parsed expiry claim.
	pub fn should_preemptively_refresh(&self, now: OffsetDateTime) -> bool {
		let slot = self.slot.read();

		match (&slot.token, slot.installed_at) {
			(Some(_), Some(installed_at)) => now - installed_at >= self.preemptive_window,
			_ => false,
		}
	}

	pub(crate) fn notify_session_terminated(&self, reason: TerminationReason) {
		for observer in self.observers.read().iter() {
			observer.session_terminated(reason);
		}
	}

	pub(crate) fn notify_redirect(&self) {
		for observer in self.observers.read().iter() {
			observer.redirect_to_entry();
		}
	}

	fn notify_token_updated(&self, token: &AccessToken) {
		for observer in self.observers.read().iter() {
			observer.token_updated(token);
		}
	}
}
impl Debug for SessionStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionStore")
			.field("authenticated", &self.is_authenticated())
			.field("last_refresh_attempt", &self.last_refresh_attempt())
			.field("preemptive_window", &self.preemptive_window)
			.finish()
	}
}
