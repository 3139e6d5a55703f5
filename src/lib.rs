//! Single-flight access-token lifecycle manager for authenticated HTTP clients—serialize
//! concurrent refreshes, replay queued requests in order, and turn credential expiry into a
//! clean session teardown.
//!
//! The crate keeps one process-wide bearer token fresh: for any number of concurrent callers
//! that hit an expired token, exactly one `POST /refresh` call is ever in flight; everyone
//! else parks in a FIFO queue and is replayed (or rejected) when the refresh settles.
//! Transient network failures are retried with a linear backoff, while a 401/403 from the
//! refresh endpoint itself escalates straight into an idempotent session termination.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod schedule;
pub mod session;
pub mod store;
pub mod terminate;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		auth::{AccessToken, TerminationReason},
		client::AuthClient,
		config::LifecycleConfig,
		http::{ReqwestProtectedClient, ReqwestRefreshTransport},
		refresh::RefreshCoordinator,
		session::{SessionObserver, SessionStore},
		terminate::SessionTerminator,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = AuthClient<ReqwestProtectedClient, ReqwestRefreshTransport>;

	/// Observer that records every emitted signal for later assertions.
	#[derive(Debug, Default)]
	pub struct RecordingObserver {
		/// Tokens installed via login or refresh.
		pub updates: Mutex<Vec<String>>,
		/// Termination reasons, in emission order.
		pub terminations: Mutex<Vec<TerminationReason>>,
		/// Number of redirect signals received.
		pub redirects: AtomicUsize,
	}
	impl SessionObserver for RecordingObserver {
		fn token_updated(&self, token: &AccessToken) {
			self.updates.lock().push(token.expose().to_string());
		}

		fn session_terminated(&self, reason: TerminationReason) {
			self.terminations.lock().push(reason);
		}

		fn redirect_to_entry(&self) {
			self.redirects.fetch_add(1, Ordering::SeqCst);
		}
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests, with an enabled cookie store.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.cookie_store(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Wires a full lifecycle stack (session, terminator, coordinator, client) against the
	/// provided configuration, returning the pieces tests assert on.
	pub fn build_reqwest_test_stack(
		config: LifecycleConfig,
	) -> (ReqwestTestClient, Arc<SessionStore>, Arc<SessionTerminator>, Arc<RecordingObserver>) {
		let session = Arc::new(SessionStore::in_memory());
		let observer = Arc::new(RecordingObserver::default());

		session.register_observer(observer.clone());

		let terminator =
			Arc::new(SessionTerminator::new(session.clone(), config.redirect_delay));
		let http = test_reqwest_client();
		let transport = ReqwestRefreshTransport::from_config(&config, http.clone())
			.expect("Test configuration should carry a base URL.");
		let protected = ReqwestProtectedClient::from_config(&config, http);
		let coordinator = Arc::new(RefreshCoordinator::new(
			session.clone(),
			transport,
			terminator.clone(),
			config,
		));
		let client = AuthClient::new(session.clone(), protected, coordinator);

		(client, session, terminator, observer)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
