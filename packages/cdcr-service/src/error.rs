use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Document for topic {topic:?} is missing or unreadable.")]
	MissingDocument { topic: String },
	#[error("Search for topic {topic:?} produced no candidates.")]
	EmptyBeam { topic: String },
	#[error("Classifier training failed: {message}")]
	ClassifierTraining { message: String },
	#[error("Stopping-rate grid is degenerate: {message}")]
	DegenerateGrid { message: String },
	#[error("Example aggregation failed for topic {topic:?} at {path:?}: {message}")]
	AggregationIo { topic: String, path: PathBuf, message: String },
	#[error("Feature computation failed: {message}")]
	Features { message: String },
	#[error("Invalid model state: {message}")]
	Model { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Round {epoch}.{function} failed: {source}")]
	Round { epoch: u32, function: u32, source: Box<Error> },
}
impl Error {
	pub(crate) fn in_round(self, epoch: u32, function: u32) -> Self {
		match self {
			Self::Round { .. } => self,
			other => Self::Round { epoch, function, source: Box::new(other) },
		}
	}
}

impl From<cdcr_domain::Error> for Error {
	fn from(err: cdcr_domain::Error) -> Self {
		match err {
			cdcr_domain::Error::DegenerateGrid { message } => Self::DegenerateGrid { message },
			other => Self::Model { message: other.to_string() },
		}
	}
}

impl From<cdcr_storage::Error> for Error {
	fn from(err: cdcr_storage::Error) -> Self {
		match err {
			cdcr_storage::Error::MissingDocument { topic, .. } => Self::MissingDocument { topic },
			cdcr_storage::Error::AggregationIo { topic, path, message } =>
				Self::AggregationIo { topic, path, message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
