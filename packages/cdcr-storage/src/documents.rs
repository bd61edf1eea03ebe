use std::path::PathBuf;

use cdcr_domain::Document;

use crate::{Error, Result};

/// Staging store for per-topic documents.
pub trait DocumentStore {
	fn load(&self, topic: &str) -> Result<Document>;

	fn save(&self, document: &Document) -> Result<()>;
}

/// One JSON file per topic: `<dir>/<topic>.json`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
	dir: PathBuf,
}
impl FsDocumentStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn path_for(&self, topic: &str) -> PathBuf {
		self.dir.join(format!("{topic}.json"))
	}
}
impl DocumentStore for FsDocumentStore {
	fn load(&self, topic: &str) -> Result<Document> {
		let path = self.path_for(topic);

		if !path.is_file() {
			return Err(Error::MissingDocument { topic: topic.to_string(), path });
		}

		let document: Document = crate::read_json(&path)?;

		if document.topic() != topic {
			tracing::warn!(
				topic,
				stored_topic = document.topic(),
				"Stored document names a different topic."
			);
		}

		Ok(document)
	}

	fn save(&self, document: &Document) -> Result<()> {
		crate::write_json(&self.path_for(document.topic()), document)
	}
}
