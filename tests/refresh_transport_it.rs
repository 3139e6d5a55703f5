#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use token_warden::{
	config::LifecycleConfig,
	error::RefreshError,
	http::{RefreshTransport, ReqwestRefreshTransport},
	reqwest,
	url::Url,
};

fn build_transport(server: &MockServer) -> ReqwestRefreshTransport {
	let base = Url::parse(&server.url("/")).expect("Mock server base URL should parse.");
	let config = LifecycleConfig::default().with_base_url(base);

	ReqwestRefreshTransport::from_config(&config, reqwest::Client::new())
		.expect("Refresh transport should resolve against the mock base URL.")
}

#[tokio::test]
async fn token_is_read_from_the_json_body() {
	let server = MockServer::start_async().await;
	let transport = build_transport(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"body-token\"}");
		})
		.await;
	let token = transport.refresh().await.expect("Body-borne token should extract.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "body-token");
}

#[tokio::test]
async fn token_is_read_from_the_authorization_header() {
	let server = MockServer::start_async().await;
	let transport = build_transport(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(204).header("authorization", "Bearer header-token");
		})
		.await;
	let token = transport.refresh().await.expect("Header-borne token should extract.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "header-token");
}

#[tokio::test]
async fn auth_statuses_map_to_the_terminal_denied_variant() {
	let server = MockServer::start_async().await;
	let transport = build_transport(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(403);
		})
		.await;
	let err = transport.refresh().await.expect_err("A 403 refresh must be rejected.");

	mock.assert_async().await;

	assert!(matches!(err, RefreshError::Denied { status: 403 }));
	assert!(!err.is_transient());
}

#[tokio::test]
async fn server_errors_map_to_a_transient_endpoint_failure() {
	let server = MockServer::start_async().await;
	let transport = build_transport(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(503).body("maintenance window");
		})
		.await;
	let err = transport.refresh().await.expect_err("A 503 refresh must be rejected.");

	mock.assert_async().await;

	assert!(matches!(err, RefreshError::Endpoint { status: 503, .. }));
	assert!(err.is_transient());
}

#[tokio::test]
async fn a_success_without_any_token_is_transient() {
	let server = MockServer::start_async().await;
	let transport = build_transport(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let err = transport.refresh().await.expect_err("A token-less success must be rejected.");

	mock.assert_async().await;

	assert!(matches!(err, RefreshError::MissingToken { status: 200 }));
	assert!(err.is_transient());
}
