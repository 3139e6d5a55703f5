//! Runtime tunables for the token lifecycle, with environment-variable overrides.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Tunables governing refresh retries, timeouts, and the preemptive scheduler.
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
	/// Base API URL the built-in transports resolve endpoints against.
	pub base_url: Option<Url>,
	/// Maximum transport attempts per refresh invocation (default 3).
	pub retry_attempts: u32,
	/// Base delay for the linear backoff schedule (default 1s).
	///
	/// The wait before retry `n` is `retry_base_delay * n`, matching the
	/// observed 1s/2s progression rather than a true exponential curve.
	pub retry_base_delay: Duration,
	/// Hard deadline for a single refresh transport call (default 15s).
	pub refresh_timeout: Duration,
	/// Per-request timeout for protected calls (default 10s).
	///
	/// Independent of queueing: a caller parked behind a refresh keeps its own
	/// deadline and is dropped from the queue when it fires.
	pub request_timeout: Duration,
	/// Poll period of the preemptive refresh scheduler (default 60s).
	pub preemptive_interval: Duration,
	/// Token age beyond which a preemptive refresh is requested (default 10min).
	pub preemptive_window: Duration,
	/// Delay between the termination notification and the redirect (default 2s).
	pub redirect_delay: Duration,
}
impl LifecycleConfig {
	/// Builds the default configuration, then applies environment overrides.
	///
	/// Recognized variables: `API_BASE_URL`, `REFRESH_RETRY_ATTEMPTS`,
	/// `REFRESH_RETRY_BASE_DELAY_MS`, `REFRESH_TIMEOUT_MS`, `REQUEST_TIMEOUT_MS`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut config = Self::default();

		if let Ok(raw) = env::var("API_BASE_URL") {
			config.base_url =
				Some(Url::parse(&raw).map_err(|source| ConfigError::InvalidBaseUrl { source })?);
		}

		config.retry_attempts =
			parse_u32("REFRESH_RETRY_ATTEMPTS", env::var("REFRESH_RETRY_ATTEMPTS").ok(), config.retry_attempts)?;
		config.retry_base_delay = parse_millis(
			"REFRESH_RETRY_BASE_DELAY_MS",
			env::var("REFRESH_RETRY_BASE_DELAY_MS").ok(),
			config.retry_base_delay,
		)?;
		config.refresh_timeout = parse_millis(
			"REFRESH_TIMEOUT_MS",
			env::var("REFRESH_TIMEOUT_MS").ok(),
			config.refresh_timeout,
		)?;
		config.request_timeout = parse_millis(
			"REQUEST_TIMEOUT_MS",
			env::var("REQUEST_TIMEOUT_MS").ok(),
			config.request_timeout,
		)?;

		Ok(config)
	}

	/// Sets the base API URL.
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Overrides the maximum number of transport attempts per refresh.
	pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
		self.retry_attempts = attempts.max(1);

		self
	}

	/// Overrides the linear backoff base delay.
	pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
		self.retry_base_delay = delay;

		self
	}

	/// Overrides the refresh transport deadline.
	pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Overrides the per-request timeout for protected calls.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the preemptive scheduler poll period.
	pub fn with_preemptive_interval(mut self, interval: Duration) -> Self {
		self.preemptive_interval = interval;

		self
	}

	/// Overrides the token-age threshold for preemptive refreshes.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = window;

		self
	}

	/// Overrides the delay before the post-termination redirect.
	pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
		self.redirect_delay = delay;

		self
	}

	/// Resolves the refresh endpoint against the configured base URL.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		let base = self.base_url.as_ref().ok_or(ConfigError::MissingBaseUrl)?;

		base.join("refresh").map_err(|source| ConfigError::InvalidBaseUrl { source })
	}
}
impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			base_url: None,
			retry_attempts: 3,
			retry_base_delay: Duration::from_millis(1_000),
			refresh_timeout: Duration::from_millis(15_000),
			request_timeout: Duration::from_millis(10_000),
			preemptive_interval: Duration::from_secs(60),
			preemptive_window: Duration::from_secs(600),
			redirect_delay: Duration::from_secs(2),
		}
	}
}

fn parse_u32(name: &'static str, raw: Option<String>, fallback: u32) -> Result<u32, ConfigError> {
	match raw {
		Some(raw) => match raw.trim().parse() {
			Ok(value) => Ok(value),
			Err(_) => Err(ConfigError::InvalidEnv { name, value: raw }),
		},
		None => Ok(fallback),
	}
}

fn parse_millis(
	name: &'static str,
	raw: Option<String>,
	fallback: Duration,
) -> Result<Duration, ConfigError> {
	match raw {
		Some(raw) => match raw.trim().parse() {
			Ok(millis) => Ok(Duration::from_millis(millis)),
			Err(_) => Err(ConfigError::InvalidEnv { name, value: raw }),
		},
		None => Ok(fallback),
	}
}
