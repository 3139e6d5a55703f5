//! Transport primitives: request descriptors, bearer attachment, and the
//! refresh/protected client contracts.
//!
//! The module exposes [`RefreshTransport`] and [`ProtectedHttpClient`] so
//! downstream code can integrate custom HTTP stacks. The built-in
//! reqwest-backed implementations are gated behind the `reqwest` feature.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{RefreshError, TransportError},
	session::SessionStore,
};
#[cfg(feature = "reqwest")]
use crate::{config::LifecycleConfig, error::ConfigError};

const AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// HTTP methods supported by the request descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP PATCH.
	Patch,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Returns the canonical method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outbound request descriptor for protected endpoints.
#[derive(Clone, Debug)]
pub struct ProtectedRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Header name/value pairs, applied in order.
	pub headers: Vec<(String, String)>,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl ProtectedRequest {
	/// Creates a descriptor for the provided method and URL.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Shorthand for a GET descriptor.
	pub fn get(url: Url) -> Self {
		Self::new(Method::Get, url)
	}

	/// Shorthand for a POST descriptor.
	pub fn post(url: Url) -> Self {
		Self::new(Method::Post, url)
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches a JSON body and the matching content type.
	pub fn with_json<T>(mut self, payload: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(payload)?);

		Ok(self.with_header("content-type", "application/json"))
	}

	/// Attaches a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Replaces any existing `Authorization` header with the provided bearer token.
	pub fn bearer(mut self, token: &AccessToken) -> Self {
		self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
		self.headers.push((AUTHORIZATION.into(), token.bearer_value()));

		self
	}
}

/// Attaches the current bearer token from the session, if one exists.
///
/// A missing token forwards the request unauthenticated; it will predictably
/// fail downstream and flow through the usual 401 handling. The authenticator
/// never blocks waiting for a token that does not exist.
pub fn attach_bearer(session: &SessionStore, request: ProtectedRequest) -> ProtectedRequest {
	match session.token() {
		Some(token) => request.bearer(&token),
		None => request,
	}
}

/// Completed response from a protected endpoint.
#[derive(Clone, Debug)]
pub struct ProtectedResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lowercase names.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ProtectedResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the first header with the provided name, case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Deserializes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
	}
}

/// Boxed future returned by [`ProtectedHttpClient::execute`].
pub type ProtectedFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ProtectedResponse, TransportError>> + 'a + Send>>;

/// Transport contract for protected API calls.
///
/// Implementations own the per-request timeout (10s by default) and surface
/// network-class failures as [`TransportError`]; HTTP error statuses are
/// returned as ordinary responses for the classifier to inspect.
pub trait ProtectedHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes the request and returns the completed response.
	fn execute(&self, request: ProtectedRequest) -> ProtectedFuture<'_>;
}

/// Boxed future returned by [`RefreshTransport::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessToken, RefreshError>> + 'a + Send>>;

/// Transport contract for the credential exchange.
///
/// One call performs one `POST /refresh`; the coordinator owns retries and the
/// 15s deadline, so implementations should not retry internally.
pub trait RefreshTransport
where
	Self: 'static + Send + Sync,
{
	/// Exchanges the out-of-band credential (e.g. an HTTP-only cookie) for a
	/// new access token.
	fn refresh(&self) -> RefreshFuture<'_>;
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
	#[serde(rename = "accessToken")]
	access_token: Option<String>,
}

/// Extracts the refreshed token from an `Authorization: Bearer` response header
/// or from the JSON body field `accessToken`, whichever the backend uses.
pub(crate) fn extract_access_token(
	headers: &[(String, String)],
	body: &[u8],
	status: u16,
) -> Result<AccessToken, RefreshError> {
	if let Some(value) = headers
		.iter()
		.find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION))
		.map(|(_, value)| value.as_str())
		&& let Some(token) = value.strip_prefix(BEARER_PREFIX)
		&& !token.is_empty()
	{
		return Ok(AccessToken::new(token));
	}

	if !body.is_empty() {
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let parsed: RefreshBody = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| RefreshError::MalformedResponse { source, status })?;

		if let Some(token) = parsed.access_token.filter(|token| !token.is_empty()) {
			return Ok(AccessToken::new(token));
		}
	}

	Err(RefreshError::MissingToken { status })
}

/// Reqwest-backed [`RefreshTransport`] issuing `POST /refresh` with no body.
///
/// The refresh credential travels out of band (an HTTP-only cookie carried by
/// the client's cookie store), so the transport sends nothing sensitive itself.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestRefreshTransport {
	client: ReqwestClient,
	endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestRefreshTransport {
	/// Wraps an existing client and refresh endpoint.
	pub fn new(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint }
	}

	/// Resolves the refresh endpoint from the configured base URL.
	pub fn from_config(config: &LifecycleConfig, client: ReqwestClient) -> Result<Self, ConfigError> {
		Ok(Self::new(client, config.refresh_endpoint()?))
	}
}
#[cfg(feature = "reqwest")]
impl RefreshTransport for ReqwestRefreshTransport {
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(async move {
			let response = self
				.client
				.post(self.endpoint.clone())
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();

			if matches!(status, 401 | 403) {
				return Err(RefreshError::Denied { status });
			}

			let headers = collect_headers(response.headers());
			let body = response.bytes().await.map_err(TransportError::from)?;

			if !(200..300).contains(&status) {
				return Err(RefreshError::Endpoint {
					status,
					message: summarize_body(&body),
				});
			}

			extract_access_token(&headers, &body, status)
		})
	}
}

/// Reqwest-backed [`ProtectedHttpClient`] with a fixed per-request timeout.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestProtectedClient {
	client: ReqwestClient,
	request_timeout: Duration,
}
#[cfg(feature = "reqwest")]
impl ReqwestProtectedClient {
	/// Wraps an existing client, applying the provided per-request timeout.
	pub fn new(client: ReqwestClient, request_timeout: Duration) -> Self {
		Self { client, request_timeout }
	}

	/// Builds a client using the configured request timeout.
	pub fn from_config(config: &LifecycleConfig, client: ReqwestClient) -> Self {
		Self::new(client, config.request_timeout)
	}
}
#[cfg(feature = "reqwest")]
impl ProtectedHttpClient for ReqwestProtectedClient {
	fn execute(&self, request: ProtectedRequest) -> ProtectedFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder =
				self.client.request(method, request.url).timeout(self.request_timeout);

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ProtectedResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn collect_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
	headers
		.iter()
		.map(|(name, value)| {
			(name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
		})
		.collect()
}

#[cfg(feature = "reqwest")]
fn summarize_body(body: &[u8]) -> String {
	const MAX: usize = 256;

	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.len() <= MAX { trimmed.to_string() } else { trimmed.chars().take(MAX).collect() }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bearer_replaces_existing_authorization_header() {
		let url = Url::parse("https://api.example.test/data").expect("URL fixture should parse.");
		let request = ProtectedRequest::get(url)
			.with_header("Authorization", "Bearer stale")
			.bearer(&AccessToken::new("fresh"));
		let values: Vec<_> = request
			.headers
			.iter()
			.filter(|(name, _)| name.eq_ignore_ascii_case("authorization"))
			.collect();

		assert_eq!(values.len(), 1);
		assert_eq!(values[0].1, "Bearer fresh");
	}

	#[test]
	fn attach_bearer_leaves_unauthenticated_requests_untouched() {
		let session = crate::session::SessionStore::in_memory();
		let url = Url::parse("https://api.example.test/data").expect("URL fixture should parse.");
		let request = attach_bearer(&session, ProtectedRequest::get(url));

		assert!(request.headers.is_empty());
	}

	#[test]
	fn token_extraction_prefers_the_header() {
		let headers = vec![("authorization".to_string(), "Bearer header-token".to_string())];
		let body = br#"{"accessToken":"body-token"}"#;
		let token = extract_access_token(&headers, body, 200)
			.expect("Header-borne token should extract.");

		assert_eq!(token.expose(), "header-token");
	}

	#[test]
	fn token_extraction_falls_back_to_the_body() {
		let token = extract_access_token(&[], br#"{"accessToken":"body-token"}"#, 200)
			.expect("Body-borne token should extract.");

		assert_eq!(token.expose(), "body-token");
	}

	#[test]
	fn token_extraction_flags_missing_and_malformed_payloads() {
		assert!(matches!(
			extract_access_token(&[], b"", 204),
			Err(RefreshError::MissingToken { status: 204 }),
		));
		assert!(matches!(
			extract_access_token(&[], b"{\"accessToken\":", 200),
			Err(RefreshError::MalformedResponse { status: 200, .. }),
		));
	}

	#[test]
	fn response_header_lookup_is_case_insensitive() {
		let response = ProtectedResponse {
			status: 200,
			headers: vec![("content-type".into(), "application/json".into())],
			body: b"{\"ok\":true}".to_vec(),
		};

		assert_eq!(response.header("Content-Type"), Some("application/json"));
		assert!(response.is_success());
	}
}
