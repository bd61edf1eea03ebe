use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Message(String),

	#[error("Test directory I/O failed at {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
