use std::path::{Path, PathBuf};

/// On-disk layout of everything one run produces.
///
/// ```text
/// <root>/<topic>/data/<epoch>/<function*1000+step>
/// <root>/<topic>/data/<epoch>/manifest-<function*1000>.json
/// <root>/outputs/<split>-<epoch>-<function>.jsonl
/// <root>/results/<table>.jsonl
/// <root>/model/<index>.json
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
	root: PathBuf,
}
impl Layout {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn data_dir(&self, topic: &str, epoch: u32) -> PathBuf {
		self.root.join(topic).join("data").join(epoch.to_string())
	}

	pub fn step_file(&self, topic: &str, epoch: u32, file_index: u32) -> PathBuf {
		self.data_dir(topic, epoch).join(file_index.to_string())
	}

	pub fn manifest(&self, topic: &str, epoch: u32, phase: u32) -> PathBuf {
		self.data_dir(topic, epoch).join(format!("manifest-{phase}.json"))
	}

	pub fn phase_output(&self, split: &str, epoch: u32, function: u32) -> PathBuf {
		self.root.join("outputs").join(format!("{split}-{epoch}-{function}.jsonl"))
	}

	pub fn result_table(&self, table: &str) -> PathBuf {
		self.root.join("results").join(format!("{table}.jsonl"))
	}
}
