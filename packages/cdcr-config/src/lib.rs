mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	BestStateCriterion, Classifier, ClassifierKind, Config, Experiment, Features, LossType, Method,
	Search, SearchKind, Stopping, StoppingMode,
};

use std::{
	collections::HashSet,
	fs,
	path::{Component, Path},
};

/// Step indices share the file-name encoding `function * 1000 + step`.
pub const MAX_STEPS_PER_FUNCTION: u32 = 999;
/// Largest function index a round may use; the validation pass runs as `functions + 1`.
pub const MAX_FUNCTIONS: u32 = 999;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.experiment.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "experiment.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.experiment.training_topics.is_empty() {
		return Err(Error::Validation {
			message: "experiment.training_topics must be non-empty.".to_string(),
		});
	}
	if cfg.experiment.testing_topics.is_empty() {
		return Err(Error::Validation {
			message: "experiment.testing_topics must be non-empty.".to_string(),
		});
	}

	for (label, topics) in [
		("experiment.training_topics", &cfg.experiment.training_topics),
		("experiment.development_topics", &cfg.experiment.development_topics),
		("experiment.testing_topics", &cfg.experiment.testing_topics),
	] {
		let mut seen = HashSet::new();

		for topic in topics {
			if topic.trim().is_empty() {
				return Err(Error::Validation {
					message: format!("{label} must not contain empty topic ids."),
				});
			}
			if !is_path_segment(topic) {
				return Err(Error::Validation {
					message: format!(
						"{label} topic {topic:?} must be a single file name without separators."
					),
				});
			}
			if !seen.insert(topic.as_str()) {
				return Err(Error::Validation {
					message: format!("{label} lists topic {topic:?} more than once."),
				});
			}
		}
	}

	check_disjoint(
		&cfg.experiment.training_topics,
		"training",
		&cfg.experiment.testing_topics,
		"testing",
	)?;
	check_disjoint(
		&cfg.experiment.development_topics,
		"development",
		&cfg.experiment.testing_topics,
		"testing",
	)?;

	if cfg.method.epochs == 0 {
		return Err(Error::Validation {
			message: "method.epochs must be greater than zero.".to_string(),
		});
	}
	if cfg.method.functions == 0 {
		return Err(Error::Validation {
			message: "method.functions must be greater than zero.".to_string(),
		});
	}
	if cfg.method.functions > MAX_FUNCTIONS {
		return Err(Error::Validation {
			message: format!("method.functions must be at most {MAX_FUNCTIONS}."),
		});
	}
	if cfg.search.beam_width == 0 {
		return Err(Error::Validation {
			message: "search.beam_width must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_steps == 0 || cfg.search.max_steps > MAX_STEPS_PER_FUNCTION {
		return Err(Error::Validation {
			message: format!("search.max_steps must be in the range 1-{MAX_STEPS_PER_FUNCTION}."),
		});
	}
	if cfg.classifier.epochs == 0 {
		return Err(Error::Validation {
			message: "classifier.epochs must be greater than zero.".to_string(),
		});
	}
	if !cfg.classifier.learning_rate.is_finite() {
		return Err(Error::Validation {
			message: "classifier.learning_rate must be a finite number.".to_string(),
		});
	}
	if cfg.classifier.learning_rate <= 0.0 {
		return Err(Error::Validation {
			message: "classifier.learning_rate must be greater than zero.".to_string(),
		});
	}
	if cfg.features.item_dim == 0 {
		return Err(Error::Validation {
			message: "features.item_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.stopping.mode == StoppingMode::Tuning {
		if cfg.experiment.development_topics.is_empty() {
			return Err(Error::Validation {
				message: "experiment.development_topics must be non-empty when stopping.mode is tuning."
					.to_string(),
			});
		}
		if !cfg.stopping.start.is_finite() || !cfg.stopping.end.is_finite() {
			return Err(Error::Validation {
				message: "stopping.start and stopping.end must be finite numbers.".to_string(),
			});
		}
		if cfg.stopping.steps <= 0 {
			return Err(Error::Validation {
				message: "stopping.steps must be greater than zero.".to_string(),
			});
		}
		if cfg.stopping.steps > 1 && cfg.stopping.start == cfg.stopping.end {
			return Err(Error::Validation {
				message: "stopping.start and stopping.end must differ when stopping.steps is greater than one."
					.to_string(),
			});
		}
	}

	Ok(())
}

fn check_disjoint(
	lhs: &[String],
	lhs_label: &'static str,
	rhs: &[String],
	rhs_label: &'static str,
) -> Result<()> {
	let rhs_set: HashSet<&str> = rhs.iter().map(String::as_str).collect();

	if let Some(topic) = lhs.iter().find(|topic| rhs_set.contains(topic.as_str())) {
		return Err(Error::OverlappingSplits {
			topic: topic.clone(),
			first: lhs_label,
			second: rhs_label,
		});
	}

	Ok(())
}

/// Topic ids name directories under the result root, so they must stay inside it.
fn is_path_segment(topic: &str) -> bool {
	let mut components = Path::new(topic).components();

	matches!(
		(components.next(), components.next()),
		(Some(Component::Normal(segment)), None) if segment == topic
	)
}

fn normalize(cfg: &mut Config) {
	for topics in [
		&mut cfg.experiment.training_topics,
		&mut cfg.experiment.development_topics,
		&mut cfg.experiment.testing_topics,
	] {
		for topic in topics.iter_mut() {
			let trimmed = topic.trim();

			if trimmed.len() != topic.len() {
				*topic = trimmed.to_string();
			}
		}
	}

	cfg.experiment.log_level = cfg.experiment.log_level.trim().to_string();
}
