use std::path::{Component, Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

/// Keyed persistence for serializable values such as per-round models.
pub trait CheckpointStore {
	fn save<T>(&self, key: &str, value: &T) -> Result<()>
	where
		T: Serialize;

	fn load<T>(&self, key: &str) -> Result<T>
	where
		T: DeserializeOwned;
}

/// Stores each key as `<root>/<key>.json`; keys may contain `/` to form directories.
#[derive(Debug, Clone)]
pub struct FsCheckpointStore {
	root: PathBuf,
}
impl FsCheckpointStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn path_for(&self, key: &str) -> Result<PathBuf> {
		let relative = Path::new(key);

		if key.is_empty()
			|| !relative.components().all(|component| matches!(component, Component::Normal(_)))
		{
			return Err(Error::InvalidKey(key.to_string()));
		}

		Ok(self.root.join(format!("{key}.json")))
	}
}
impl CheckpointStore for FsCheckpointStore {
	fn save<T>(&self, key: &str, value: &T) -> Result<()>
	where
		T: Serialize,
	{
		let path = self.path_for(key)?;

		crate::write_json(&path, value)?;

		tracing::debug!(key, path = %path.display(), "Checkpoint saved.");

		Ok(())
	}

	fn load<T>(&self, key: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		crate::read_json(&self.path_for(key)?)
	}
}

/// Checkpoint key of the model trained in round (`epoch`, `function`).
pub fn model_key(epoch: u32, function: u32, functions: u32) -> String {
	format!("model/{}", epoch.saturating_sub(1) * functions + function)
}
