//! Thread-safe in-memory [`TokenVault`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{TokenVault, VaultError},
};

/// Thread-safe vault that keeps the token in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryVault(Arc<RwLock<Option<AccessToken>>>);
impl TokenVault for MemoryVault {
	fn load(&self) -> Result<Option<AccessToken>, VaultError> {
		Ok(self.0.read().clone())
	}

	fn persist(&self, token: &AccessToken) -> Result<(), VaultError> {
		*self.0.write() = Some(token.clone());

		Ok(())
	}

	fn clear(&self) -> Result<(), VaultError> {
		*self.0.write() = None;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn persist_load_clear_round_trip() {
		let vault = MemoryVault::default();

		assert_eq!(vault.load().expect("Empty vault load should succeed."), None);

		vault
			.persist(&AccessToken::new("token-1"))
			.expect("Persisting into the memory vault should succeed.");

		let loaded = vault
			.load()
			.expect("Vault load should succeed after persist.")
			.expect("Persisted token should be present.");

		assert_eq!(loaded.expose(), "token-1");

		vault.clear().expect("Clearing the memory vault should succeed.");

		assert_eq!(vault.load().expect("Vault load should succeed after clear."), None);
	}
}
