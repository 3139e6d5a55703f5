//! Authenticated client: bearer attachment, classification, and replay-once.

// self
use crate::{
	_prelude::*,
	classify::{Disposition, classify},
	http::{self, ProtectedHttpClient, ProtectedRequest, ProtectedResponse, RefreshTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	refresh::RefreshCoordinator,
	session::SessionStore,
};

/// Executes protected calls with transparent token refresh and replay.
///
/// The client attaches the current bearer token, runs the request, and on a
/// first 401/403 parks behind the coordinator's single-flight refresh before
/// replaying exactly once with the new token. Every other status passes
/// through unchanged; the caller inspects it as it would any HTTP response.
#[derive(Clone)]
pub struct AuthClient<P, T>
where
	P: ?Sized + ProtectedHttpClient,
	T: ?Sized + RefreshTransport,
{
	session: Arc<SessionStore>,
	protected: Arc<P>,
	coordinator: Arc<RefreshCoordinator<T>>,
}
impl<P, T> AuthClient<P, T>
where
	P: ?Sized + ProtectedHttpClient,
	T: ?Sized + RefreshTransport,
{
	/// Creates a client over the provided transport and coordinator.
	pub fn new(
		session: Arc<SessionStore>,
		protected: impl Into<Arc<P>>,
		coordinator: Arc<RefreshCoordinator<T>>,
	) -> Self {
		Self { session, protected: protected.into(), coordinator }
	}

	/// Returns the session store backing this client.
	pub fn session(&self) -> &Arc<SessionStore> {
		&self.session
	}

	/// Returns the refresh coordinator backing this client.
	pub fn coordinator(&self) -> &Arc<RefreshCoordinator<T>> {
		&self.coordinator
	}

	/// Executes a protected request, refreshing and replaying once on 401/403.
	pub async fn execute(&self, request: ProtectedRequest) -> Result<ProtectedResponse> {
		const KIND: FlowKind = FlowKind::Protected;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute_inner(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn execute_inner(&self, request: ProtectedRequest) -> Result<ProtectedResponse> {
		let authenticated = http::attach_bearer(&self.session, request.clone());
		let response = self.protected.execute(authenticated).await?;

		// A first pass never classifies as `RetryExhausted`; anything that is
		// not an expired-auth status goes straight back to the caller.
		if !matches!(classify(response.status, false), Disposition::AuthExpired) {
			return Ok(response);
		}

		let token = self.coordinator.ensure_fresh_token().await?;
		let replay = self.protected.execute(request.bearer(&token)).await?;

		match classify(replay.status, true) {
			Disposition::RetryExhausted => Err(Error::AuthRetryExhausted { status: replay.status }),
			_ => Ok(replay),
		}
	}
}
impl<P, T> Debug for AuthClient<P, T>
where
	P: ?Sized + ProtectedHttpClient,
	T: ?Sized + RefreshTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient").field("session", &self.session).finish()
	}
}
