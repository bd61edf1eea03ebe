mod error;

pub use error::{Error, Result};

use std::{
	collections::BTreeMap,
	env, fs,
	path::{Path, PathBuf},
};

use uuid::Uuid;

use cdcr_config::{
	Classifier, Config, Experiment, Features, Method, Search, Stopping, StoppingMode,
};
use cdcr_domain::{Document, ItemId, Partition, Score, Scorer};

/// Throwaway experiment directory with a result and a document area, removed on drop.
pub struct TempExperiment {
	root: PathBuf,
	cleaned: bool,
}
impl TempExperiment {
	pub fn new() -> Result<Self> {
		let root = env::temp_dir().join(format!("cdcr_test_{}", Uuid::new_v4().simple()));

		for dir in [root.join("results"), root.join("documents")] {
			fs::create_dir_all(&dir).map_err(|source| Error::Io { path: dir.clone(), source })?;
		}

		Ok(Self { root, cleaned: false })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn result_dir(&self) -> PathBuf {
		self.root.join("results")
	}

	pub fn document_dir(&self) -> PathBuf {
		self.root.join("documents")
	}

	/// Stages a document where the filesystem document store looks for it.
	pub fn write_document(&self, document: &Document) -> Result<()> {
		let path = self.document_dir().join(format!("{}.json", document.topic()));
		let raw = serde_json::to_vec_pretty(document)?;

		fs::write(&path, raw).map_err(|source| Error::Io { path, source })
	}

	/// Small single-epoch configuration over the given splits, tuning disabled.
	pub fn config(
		&self,
		training: &[&str],
		development: &[&str],
		testing: &[&str],
		item_dim: u32,
	) -> Config {
		let topics = |topics: &[&str]| topics.iter().map(|topic| topic.to_string()).collect();

		Config {
			experiment: Experiment {
				result_dir: self.result_dir(),
				document_dir: self.document_dir(),
				log_level: "debug".to_string(),
				training_topics: topics(training),
				development_topics: topics(development),
				testing_topics: topics(testing),
			},
			method: Method { epochs: 1, functions: 2, ..Method::default() },
			search: Search { beam_width: 3, max_steps: 50, ..Search::default() },
			classifier: Classifier::default(),
			stopping: Stopping { mode: StoppingMode::None, ..Stopping::default() },
			features: Features { item_dim },
		}
	}

	pub fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner()
	}

	fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		fs::remove_dir_all(&self.root)
			.map_err(|source| Error::Io { path: self.root.clone(), source })?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TempExperiment {
	fn drop(&mut self) {
		if env_keep_dirs() {
			eprintln!("Keeping test experiment at {:?}.", self.root);

			return;
		}
		if let Err(err) = self.cleanup_inner() {
			eprintln!("Test experiment cleanup failed: {err}.");
		}
	}
}

/// Set `CDCR_KEEP_TEST_DIRS` to inspect experiment output after a test run.
pub fn env_keep_dirs() -> bool {
	env::var_os("CDCR_KEEP_TEST_DIRS").is_some()
}

/// Document whose items carry one-hot vectors keyed by their gold cluster, so items that belong
/// together look alike.
pub fn fixture_document(topic: &str, groups: &[&[ItemId]], item_dim: usize) -> Result<Document> {
	let gold = Partition::from_groups(groups.iter().map(|group| group.iter().copied()))
		.map_err(|err| Error::Message(format!("Invalid fixture partition: {err}.")))?;
	let mut features = BTreeMap::new();

	for (index, group) in groups.iter().enumerate() {
		let mut vector = vec![0.0; item_dim.max(1)];
		let slot = index % vector.len();

		vector[slot] = 1.0;

		for item in *group {
			features.insert(*item, vector.clone());
		}
	}

	Ok(Document::new(topic, gold, features))
}

/// Scores 1.0 on every metric when the grouping matches gold exactly, 0.0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchScorer;
impl Scorer for ExactMatchScorer {
	fn score(&self, predicted: &Partition, gold: &Partition) -> Score {
		let value = if predicted.same_grouping(gold) { 1.0 } else { 0.0 };

		Score {
			f1: value,
			precision: value,
			recall: value,
			composite: value,
			muc_f1: value,
			bcubed_f1: value,
			ceafe_f1: value,
		}
	}
}
