#![cfg(feature = "reqwest")]

// std
use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use httpmock::prelude::*;
// self
use token_warden::{
	auth::{AccessToken, TerminationReason},
	client::AuthClient,
	config::LifecycleConfig,
	error::Error,
	http::{ProtectedRequest, ReqwestProtectedClient, ReqwestRefreshTransport},
	refresh::RefreshCoordinator,
	reqwest,
	session::{SessionObserver, SessionStore},
	terminate::SessionTerminator,
	url::Url,
};

#[derive(Default)]
struct RecordingObserver {
	terminations: Mutex<Vec<TerminationReason>>,
	redirects: AtomicUsize,
}
impl SessionObserver for RecordingObserver {
	fn token_updated(&self, _: &AccessToken) {}

	fn session_terminated(&self, reason: TerminationReason) {
		self.terminations
			.lock()
			.expect("Observer mutex should not be poisoned.")
			.push(reason);
	}

	fn redirect_to_entry(&self) {
		self.redirects.fetch_add(1, Ordering::SeqCst);
	}
}

type Stack = (
	AuthClient<ReqwestProtectedClient, ReqwestRefreshTransport>,
	Arc<SessionStore>,
	Arc<RecordingObserver>,
);

fn build_stack(server: &MockServer, config: LifecycleConfig) -> Stack {
	let base = Url::parse(&server.url("/")).expect("Mock server base URL should parse.");
	let config = config.with_base_url(base);
	let session = Arc::new(SessionStore::in_memory());
	let observer = Arc::new(RecordingObserver::default());

	session.register_observer(observer.clone());

	let terminator = Arc::new(SessionTerminator::new(session.clone(), config.redirect_delay));
	let http = reqwest::Client::new();
	let transport = ReqwestRefreshTransport::from_config(&config, http.clone())
		.expect("Refresh transport should resolve against the mock base URL.");
	let protected = ReqwestProtectedClient::from_config(&config, http);
	let coordinator =
		Arc::new(RefreshCoordinator::new(session.clone(), transport, terminator, config));
	let client = AuthClient::new(session.clone(), protected, coordinator);

	(client, session, observer)
}

fn endpoint(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint URL should parse.")
}

#[tokio::test]
async fn expired_call_refreshes_then_replays_with_the_new_token() {
	let server = MockServer::start_async().await;
	let (client, session, _) = build_stack(&server, LifecycleConfig::default());

	session.set_token(AccessToken::new("t1")).expect("Seeding the session should succeed.");

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer t2");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"demo\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"t2\"}");
		})
		.await;
	let response = client
		.execute(ProtectedRequest::get(endpoint(&server, "/profile")))
		.await
		.expect("Expired call should succeed after refresh and replay.");

	assert_eq!(response.status, 200);

	stale.assert_async().await;
	fresh.assert_async().await;
	refresh.assert_async().await;

	assert_eq!(
		session.token().expect("Session should hold the refreshed token.").expose(),
		"t2",
	);
}

#[tokio::test]
async fn a_second_auth_failure_after_replay_is_a_hard_failure() {
	let server = MockServer::start_async().await;
	let (client, session, observer) = build_stack(&server, LifecycleConfig::default());

	session.set_token(AccessToken::new("t1")).expect("Seeding the session should succeed.");

	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"t2\"}");
		})
		.await;
	let err = client
		.execute(ProtectedRequest::get(endpoint(&server, "/profile")))
		.await
		.expect_err("A replayed 401 must surface as a hard failure.");

	assert!(matches!(err, Error::AuthRetryExhausted { status: 401 }));

	refresh.assert_calls_async(1).await;
	profile.assert_calls_async(2).await;

	assert!(
		observer
			.terminations
			.lock()
			.expect("Observer mutex should not be poisoned.")
			.is_empty(),
		"A permissions problem on one request must not tear the session down.",
	);
}

#[tokio::test]
async fn non_auth_errors_pass_through_unchanged() {
	let server = MockServer::start_async().await;
	let (client, session, _) = build_stack(&server, LifecycleConfig::default());

	session.set_token(AccessToken::new("t1")).expect("Seeding the session should succeed.");

	let flaky = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports");
			then.status(503).body("upstream unavailable");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200);
		})
		.await;
	let response = client
		.execute(ProtectedRequest::get(endpoint(&server, "/reports")))
		.await
		.expect("Non-auth statuses should pass through as responses.");

	assert_eq!(response.status, 503);

	flaky.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn five_parallel_expired_calls_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (client, session, _) = build_stack(&server, LifecycleConfig::default());

	session.set_token(AccessToken::new("t1")).expect("Seeding the session should succeed.");

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/data").header("authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/data").header("authorization", "Bearer t2");
			then.status(200).body("ok");
		})
		.await;
	// The delay keeps the refresh in flight long enough for every caller to park.
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200).header("authorization", "Bearer t2").delay(Duration::from_millis(500));
		})
		.await;
	let request = || ProtectedRequest::get(endpoint(&server, "/data"));
	let (a, b, c, d, e) = tokio::join!(
		client.execute(request()),
		client.execute(request()),
		client.execute(request()),
		client.execute(request()),
		client.execute(request()),
	);

	for response in [a, b, c, d, e] {
		let response = response.expect("Every parallel caller should succeed after the refresh.");

		assert_eq!(response.status, 200);
	}

	refresh.assert_calls_async(1).await;
	stale.assert_calls_async(5).await;
	fresh.assert_calls_async(5).await;
}

#[tokio::test]
async fn terminal_refresh_tears_the_session_down_and_redirects() {
	let server = MockServer::start_async().await;
	let (client, session, observer) = build_stack(
		&server,
		LifecycleConfig::default().with_redirect_delay(Duration::from_millis(10)),
	);

	session.set_token(AccessToken::new("t1")).expect("Seeding the session should succeed.");

	let _profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(401);
		})
		.await;
	let err = client
		.execute(ProtectedRequest::get(endpoint(&server, "/profile")))
		.await
		.expect_err("A denied refresh must reject the original caller.");

	assert!(matches!(
		err,
		Error::SessionTerminated { reason: TerminationReason::RefreshTokenExpired },
	));

	refresh.assert_calls_async(1).await;

	assert!(!session.is_authenticated());
	assert_eq!(
		*observer.terminations.lock().expect("Observer mutex should not be poisoned."),
		vec![TerminationReason::RefreshTokenExpired],
	);

	// The redirect fires after the notification delay.
	tokio::time::sleep(Duration::from_millis(100)).await;

	assert_eq!(observer.redirects.load(Ordering::SeqCst), 1);
}
