use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub experiment: Experiment,
	#[serde(default)]
	pub method: Method,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub classifier: Classifier,
	#[serde(default)]
	pub stopping: Stopping,
	pub features: Features,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Experiment {
	/// Root of everything a run writes: example corpus, phase outputs, result tables, models.
	pub result_dir: PathBuf,
	/// Staging store holding one serialized document per topic.
	pub document_dir: PathBuf,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	pub training_topics: Vec<String>,
	#[serde(default)]
	pub development_topics: Vec<String>,
	pub testing_topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Method {
	pub epochs: u32,
	pub functions: u32,
	/// Test with the averaged weight instead of the latest one.
	pub average_weight: bool,
	pub best_state: BestStateCriterion,
	pub validate_on_training: bool,
}
impl Default for Method {
	fn default() -> Self {
		Self {
			epochs: 1,
			functions: 3,
			average_weight: true,
			best_state: BestStateCriterion::ModelScore,
			validate_on_training: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestStateCriterion {
	ModelScore,
	TrueLoss,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub kind: SearchKind,
	pub beam_width: u32,
	pub max_steps: u32,
	pub loss: LossType,
}
impl Search {
	/// Beam capacity actually used by the engine for the configured search kind.
	pub fn effective_width(&self) -> usize {
		match self.kind {
			SearchKind::Beam => self.beam_width.max(1) as usize,
			SearchKind::Greedy => 1,
		}
	}
}
impl Default for Search {
	fn default() -> Self {
		Self { kind: SearchKind::Beam, beam_width: 5, max_steps: 999, loss: LossType::Pairwise }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
	Beam,
	Greedy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
	Pairwise,
	Muc,
	Bcubed,
	CeafE,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Classifier {
	pub kind: ClassifierKind,
	pub epochs: u32,
	pub learning_rate: f64,
}
impl Default for Classifier {
	fn default() -> Self {
		Self { kind: ClassifierKind::StructuredPerceptron, epochs: 10, learning_rate: 1.0 }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
	StructuredPerceptron,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Stopping {
	pub mode: StoppingMode,
	pub start: f64,
	pub end: f64,
	pub steps: i64,
}
impl Default for Stopping {
	fn default() -> Self {
		Self { mode: StoppingMode::None, start: 1.0, end: 3.0, steps: 10 }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingMode {
	Tuning,
	None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Features {
	/// Length of every item attribute vector in the documents.
	pub item_dim: u32,
}

fn default_log_level() -> String {
	"info".to_string()
}
