//! Persistence contracts and built-in vault implementations for the session token.

pub mod file;
pub mod memory;

pub use file::FileVault;
pub use memory::MemoryVault;

// self
use crate::{_prelude::*, auth::AccessToken};

/// Key under which the access token is persisted by keyed backends.
///
/// Absence of the key means "unauthenticated".
pub const VAULT_KEY: &str = "accessToken";

/// Client-side persistent key-value store holding the current access token.
///
/// The contract is deliberately synchronous: the session store reads the token
/// on the hot path of every outbound request, so backends must answer without
/// suspending. Implementations that talk to slower media should keep their own
/// in-process snapshot.
pub trait TokenVault
where
	Self: Send + Sync,
{
	/// Loads the persisted token, if any.
	fn load(&self) -> Result<Option<AccessToken>, VaultError>;

	/// Persists or replaces the token under [`VAULT_KEY`].
	fn persist(&self, token: &AccessToken) -> Result<(), VaultError>;

	/// Removes the persisted token.
	fn clear(&self) -> Result<(), VaultError>;
}

/// Error type produced by [`TokenVault`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum VaultError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn vault_error_converts_into_crate_error_with_source() {
		let vault_error = VaultError::Backend { message: "disk unreachable".into() };
		let crate_error: Error = vault_error.clone().into();

		assert!(matches!(crate_error, Error::Vault(_)));
		assert!(crate_error.to_string().contains("disk unreachable"));

		let source = StdError::source(&crate_error)
			.expect("Crate error should expose the original vault error as its source.");

		assert_eq!(source.to_string(), vault_error.to_string());
	}
}
