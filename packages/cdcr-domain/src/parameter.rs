use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Linear model weights with the running total needed for perceptron averaging.
///
/// Invariants: `violations` counts every applied update, and `total_weight` is the sum of
/// `weight` snapshots taken right after each update. Cloning yields an independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameter")]
pub struct Parameter {
	weight: Vec<f64>,
	total_weight: Vec<f64>,
	violations: u64,
}
impl Parameter {
	pub fn new(len: usize) -> Self {
		Self { weight: vec![0.0; len], total_weight: vec![0.0; len], violations: 0 }
	}

	pub fn from_weight(weight: Vec<f64>) -> Self {
		let total_weight = vec![0.0; weight.len()];

		Self { weight, total_weight, violations: 0 }
	}

	pub fn len(&self) -> usize {
		self.weight.len()
	}

	pub fn is_empty(&self) -> bool {
		self.weight.is_empty()
	}

	pub fn weight(&self) -> &[f64] {
		&self.weight
	}

	pub fn total_weight(&self) -> &[f64] {
		&self.total_weight
	}

	pub fn violations(&self) -> u64 {
		self.violations
	}

	/// Perceptron correction: `weight += delta`, then accumulate the new weight.
	pub fn update(&mut self, delta: &[f64]) -> Result<()> {
		check_len(self.weight.len(), delta.len())?;

		for ((weight, total), step) in
			self.weight.iter_mut().zip(self.total_weight.iter_mut()).zip(delta)
		{
			*weight += step;
			*total += *weight;
		}

		self.violations += 1;

		Ok(())
	}

	pub fn average(&self) -> Vec<f64> {
		if self.violations == 0 {
			return vec![0.0; self.weight.len()];
		}

		let count = self.violations as f64;

		self.total_weight.iter().map(|total| total / count).collect()
	}

	/// Weight handed to testing-mode search.
	pub fn weight_for_testing(&self, averaged: bool) -> Vec<f64> {
		if averaged { self.average() } else { self.weight.clone() }
	}

	pub fn score(&self, features: &[f64]) -> Result<f64> {
		dot(&self.weight, features)
	}
}

#[derive(Deserialize)]
struct RawParameter {
	weight: Vec<f64>,
	total_weight: Vec<f64>,
	violations: u64,
}
impl TryFrom<RawParameter> for Parameter {
	type Error = Error;

	fn try_from(raw: RawParameter) -> Result<Self> {
		check_len(raw.weight.len(), raw.total_weight.len())?;

		Ok(Self { weight: raw.weight, total_weight: raw.total_weight, violations: raw.violations })
	}
}

pub fn dot(weight: &[f64], features: &[f64]) -> Result<f64> {
	check_len(weight.len(), features.len())?;

	Ok(weight.iter().zip(features).map(|(w, f)| w * f).sum())
}

/// Elementwise `lhs - rhs`.
pub fn difference(lhs: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
	check_len(lhs.len(), rhs.len())?;

	Ok(lhs.iter().zip(rhs).map(|(l, r)| l - r).collect())
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
	if expected != actual {
		return Err(Error::Dimension { expected, actual });
	}

	Ok(())
}
