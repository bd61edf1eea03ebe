//! Filesystem persistence for an experiment: documents, example corpus, result tables,
//! phase outputs and model checkpoints, all rooted under one result directory.

pub mod checkpoint;
pub mod documents;
pub mod examples;
pub mod layout;
pub mod outputs;
pub mod results;

mod error;
mod timestamp;

pub use checkpoint::{CheckpointStore, FsCheckpointStore, model_key};
pub use documents::{DocumentStore, FsDocumentStore};
pub use error::{Error, Result};
pub use examples::{
	ExampleCorpus, ExampleFile, ExampleRow, PHASE_STRIDE, TopicExamples, sort_numeric,
};
pub use layout::Layout;
pub use outputs::PhaseOutput;
pub use results::{ResultRow, ResultTables, RoundRecord};

use std::{
	fs::{self, OpenOptions},
	io::Write,
	path::Path,
};

use serde::{Serialize, de::DeserializeOwned};

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)
			.map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
	}

	Ok(())
}

pub(crate) fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
	T: ?Sized + Serialize,
{
	let raw = serde_json::to_vec_pretty(value)
		.map_err(|source| Error::Encode { what: path.display().to_string(), source })?;

	ensure_parent(path)?;

	fs::write(path, raw).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

pub(crate) fn read_json<T>(path: &Path) -> Result<T>
where
	T: DeserializeOwned,
{
	let raw = fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

	serde_json::from_slice(&raw).map_err(|source| Error::Decode { path: path.to_path_buf(), source })
}

/// Appends one JSON object as a line, creating the file on first use.
pub(crate) fn append_json_line<T>(path: &Path, value: &T) -> Result<()>
where
	T: ?Sized + Serialize,
{
	let mut line = serde_json::to_vec(value)
		.map_err(|source| Error::Encode { what: path.display().to_string(), source })?;

	line.push(b'\n');

	ensure_parent(path)?;

	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

	file.write_all(&line).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}
