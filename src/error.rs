//! Crate-level error types shared across the session, transport, and refresh layers.

// self
use crate::{_prelude::*, auth::TerminationReason};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout) on a protected call.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Persisted token vault failure.
	#[error("{0}")]
	Vault(
		#[from]
		#[source]
		crate::store::VaultError,
	),

	/// The refresh settled terminally and the session was torn down.
	///
	/// Callers must treat this as "the user needs to re-authenticate", not as a
	/// retryable error.
	#[error("Session terminated: {reason}.")]
	SessionTerminated {
		/// Terminal classification of the refresh outcome.
		reason: TerminationReason,
	},
	/// A protected call failed 401/403 again after a replay with a fresh token.
	///
	/// A second auth failure with a brand-new token indicates a non-token
	/// problem (permissions), so the request is not routed back into the
	/// refresh cycle.
	#[error("Request was rejected ({status}) even after replaying with a fresh token.")]
	AuthRetryExhausted {
		/// HTTP status returned by the replayed request.
		status: u16,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Environment variable holds a value that cannot be parsed.
	#[error("Environment variable `{name}` holds an invalid value: `{value}`.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Offending raw value.
		value: String,
	},
	/// Base API URL cannot be parsed.
	#[error("Base API URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A transport was requested but no base API URL is configured.
	#[error("No base API URL is configured.")]
	MissingBaseUrl,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, timeout). Transient by definition.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while executing the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while executing the request.")]
	Io(#[from] std::io::Error),
	/// The request exceeded its deadline.
	#[error("Request timed out.")]
	Timeout,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Outcome of a single call to the refresh endpoint.
///
/// [`Denied`](RefreshError::Denied) is terminal; every other variant is a
/// transient failure the coordinator retries with backoff.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// The refresh endpoint rejected the credential (401/403); retrying cannot help.
	#[error("Refresh endpoint rejected the credential ({status}).")]
	Denied {
		/// HTTP status code (401 or 403).
		status: u16,
	},
	/// The refresh endpoint returned an unexpected non-auth response.
	#[error("Refresh endpoint returned an unexpected response ({status}): {message}.")]
	Endpoint {
		/// HTTP status code.
		status: u16,
		/// Short summary of the response payload.
		message: String,
	},
	/// The refresh endpoint responded with malformed JSON.
	#[error("Refresh endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// A 2xx response carried no token in the header or the body.
	#[error("Refresh response ({status}) carried no access token.")]
	MissingToken {
		/// HTTP status code of the response.
		status: u16,
	},
	/// Network-class failure while calling the refresh endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl RefreshError {
	/// Returns `true` when the failure is safe to retry with backoff.
	pub fn is_transient(&self) -> bool {
		!matches!(self, Self::Denied { .. })
	}
}
