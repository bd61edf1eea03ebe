use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("I/O failure on {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Malformed JSON in {path:?}: {source}")]
	Decode { path: PathBuf, source: serde_json::Error },
	#[error("Failed to encode {what}: {source}")]
	Encode { what: String, source: serde_json::Error },
	#[error("No document for topic {topic:?} at {path:?}.")]
	MissingDocument { topic: String, path: PathBuf },
	#[error("Example aggregation failed for topic {topic:?} at {path:?}: {message}")]
	AggregationIo { topic: String, path: PathBuf, message: String },
	#[error("Invalid storage key: {0}")]
	InvalidKey(String),
}
