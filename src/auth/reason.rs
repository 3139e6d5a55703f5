//! Terminal-failure reasons surfaced when the session is torn down.

// self
use crate::_prelude::*;

/// Why the session was terminated.
///
/// The two variants carry different user-facing wording so a connectivity
/// problem is never presented as invalid credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
	/// The refresh endpoint rejected the credential itself (401/403).
	RefreshTokenExpired,
	/// Transient network failures exhausted every retry attempt.
	RefreshUnreachable,
}
impl TerminationReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TerminationReason::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
			TerminationReason::RefreshUnreachable => "REFRESH_UNREACHABLE",
		}
	}

	/// Returns the notification text shown to the user for this reason.
	pub const fn user_message(self) -> &'static str {
		match self {
			TerminationReason::RefreshTokenExpired =>
				"Your session has expired. Please sign in again.",
			TerminationReason::RefreshUnreachable =>
				"A network issue interrupted your session. Please check your connection and sign in again.",
		}
	}
}
impl Display for TerminationReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn reasons_distinguish_expiry_from_connectivity() {
		assert_eq!(TerminationReason::RefreshTokenExpired.as_str(), "REFRESH_TOKEN_EXPIRED");
		assert_eq!(TerminationReason::RefreshUnreachable.as_str(), "REFRESH_UNREACHABLE");
		assert_ne!(
			TerminationReason::RefreshTokenExpired.user_message(),
			TerminationReason::RefreshUnreachable.user_message(),
		);
	}
}
