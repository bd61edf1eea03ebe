use cdcr_config::Classifier as ClassifierConfig;
use cdcr_domain::{Parameter, parameter::dot};
use cdcr_storage::{ExampleFile, TopicExamples};

use crate::{Error, Result};

/// Learns a fresh Parameter from the aggregated example files.
pub trait Classifier {
	fn train(&mut self, examples: &[TopicExamples], function: u32) -> Result<Parameter>;
}

/// Averaged structured perceptron over example files.
///
/// Each file is one ranking problem: the row labelled 1 should outscore every other row.
#[derive(Debug, Clone)]
pub struct StructuredPerceptron {
	feature_len: usize,
	epochs: u32,
	learning_rate: f64,
}
impl StructuredPerceptron {
	pub fn new(feature_len: usize, epochs: u32, learning_rate: f64) -> Self {
		Self { feature_len, epochs, learning_rate }
	}

	pub fn from_config(feature_len: usize, cfg: &ClassifierConfig) -> Self {
		Self::new(feature_len, cfg.epochs, cfg.learning_rate)
	}

	fn check(&self, topic: &str, file: &ExampleFile) -> Result<usize> {
		let invalid = |message: String| Error::ClassifierTraining {
			message: format!("topic {topic:?}, epoch {}, file {}: {message}", file.epoch, file.name),
		};

		if let Some(row) = file.rows.iter().find(|row| row.features.len() != self.feature_len) {
			return Err(invalid(format!(
				"row has {} features, expected {}",
				row.features.len(),
				self.feature_len
			)));
		}

		match file.rows.iter().filter(|row| row.label == 1).count() {
			1 => file
				.rows
				.iter()
				.position(|row| row.label == 1)
				.ok_or_else(|| invalid("no positive row".to_string())),
			count => Err(invalid(format!("expected exactly one positive row, found {count}"))),
		}
	}
}
impl Classifier for StructuredPerceptron {
	fn train(&mut self, examples: &[TopicExamples], function: u32) -> Result<Parameter> {
		let mut problems = Vec::new();

		for topic in examples {
			for file in &topic.files {
				problems.push((file, self.check(&topic.topic, file)?));
			}
		}

		let mut parameter = Parameter::new(self.feature_len);

		if problems.is_empty() {
			tracing::warn!(function, "No example files to train on.");

			return Ok(parameter);
		}

		for pass in 0..self.epochs {
			let mut mistakes = 0_usize;

			for (file, positive) in &problems {
				let mut predicted = 0;
				let mut predicted_score = f64::NEG_INFINITY;

				for (index, row) in file.rows.iter().enumerate() {
					let score = dot(parameter.weight(), &row.features)?;

					if score > predicted_score {
						predicted = index;
						predicted_score = score;
					}
				}

				if predicted == *positive {
					continue;
				}

				let delta: Vec<f64> = file.rows[*positive]
					.features
					.iter()
					.zip(&file.rows[predicted].features)
					.map(|(gold, guess)| self.learning_rate * (gold - guess))
					.collect();

				parameter.update(&delta)?;

				mistakes += 1;
			}

			tracing::debug!(function, pass, mistakes, "Perceptron pass finished.");

			if mistakes == 0 {
				break;
			}
		}

		tracing::info!(
			function,
			files = problems.len(),
			violations = parameter.violations(),
			"Classifier trained."
		);

		Ok(parameter)
	}
}
