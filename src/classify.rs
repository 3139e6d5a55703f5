//! Failure classification for completed protected calls.

/// What the lifecycle subsystem should do with a completed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
	/// 2xx; hand the response back to the caller.
	Success,
	/// 401/403 on a first pass; run the refresh cycle and replay once.
	AuthExpired,
	/// 401/403 again after a replay with a fresh token; surface a hard failure.
	RetryExhausted,
	/// Any other status; not this subsystem's concern, pass through unchanged.
	PassThrough,
}

/// Classifies a response status.
///
/// `already_replayed` is the retry-once guard: a request that failed 401/403
/// after already being replayed with a fresh token must not re-enter the
/// refresh cycle, since a second auth failure with a brand-new token indicates
/// a non-token problem.
pub fn classify(status: u16, already_replayed: bool) -> Disposition {
	match status {
		200..=299 => Disposition::Success,
		401 | 403 if !already_replayed => Disposition::AuthExpired,
		401 | 403 => Disposition::RetryExhausted,
		_ => Disposition::PassThrough,
	}
}
