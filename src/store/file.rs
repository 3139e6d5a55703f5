//! Simple file-backed [`TokenVault`] for lightweight desktop and CLI deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{TokenVault, VaultError},
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct VaultSnapshot {
	#[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
	access_token: Option<String>,
}

/// Persists the session token to a JSON file after each mutation.
///
/// Writes go through a temporary file followed by a rename so a crash mid-write
/// never corrupts the stored token.
#[derive(Clone, Debug)]
pub struct FileVault {
	path: PathBuf,
}
impl FileVault {
	/// Opens a vault at the provided path, creating parent directories on demand.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, VaultError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path })
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), VaultError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| VaultError::Backend {
				message: format!("Failed to create vault directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn load_snapshot(&self) -> Result<VaultSnapshot, VaultError> {
		if !self.path.exists() {
			return Ok(VaultSnapshot::default());
		}

		let metadata = self.path.metadata().map_err(|e| VaultError::Backend {
			message: format!("Failed to inspect {}: {e}", self.path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(VaultSnapshot::default());
		}

		let bytes = fs::read(&self.path).map_err(|e| VaultError::Backend {
			message: format!("Failed to read {}: {e}", self.path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| VaultError::Serialization {
			message: format!("Failed to parse {}: {e}", self.path.display()),
		})
	}

	fn persist_snapshot(&self, snapshot: &VaultSnapshot) -> Result<(), VaultError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(snapshot).map_err(|e| VaultError::Serialization {
				message: format!("Failed to serialize vault snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| VaultError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| VaultError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| VaultError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| VaultError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenVault for FileVault {
	fn load(&self) -> Result<Option<AccessToken>, VaultError> {
		Ok(self.load_snapshot()?.access_token.map(AccessToken::new))
	}

	fn persist(&self, token: &AccessToken) -> Result<(), VaultError> {
		self.persist_snapshot(&VaultSnapshot { access_token: Some(token.expose().to_string()) })
	}

	fn clear(&self) -> Result<(), VaultError> {
		self.persist_snapshot(&VaultSnapshot::default())
	}
}
