//! Clustering evaluation: pairwise links, MUC, B-cubed, CEAF-e and the CoNLL average.
//!
//! When both the precision and the recall denominators are zero the prediction is trivially
//! correct and scores 1.0 across the board; a single zero denominator scores 0.0 on that side.

use std::collections::BTreeMap;

use serde::Serialize;

use cdcr_config::LossType;

use crate::partition::{ClusterId, Partition};

/// Scores one predicted partition against gold.
pub trait Scorer {
	fn score(&self, predicted: &Partition, gold: &Partition) -> Score;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Score {
	/// Headline F1 for the configured loss.
	pub f1: f64,
	pub precision: f64,
	pub recall: f64,
	/// CoNLL average, used for model selection.
	pub composite: f64,
	pub muc_f1: f64,
	pub bcubed_f1: f64,
	pub ceafe_f1: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Prf {
	pub precision: f64,
	pub recall: f64,
	pub f1: f64,
}
impl Prf {
	pub fn new(precision: f64, recall: f64) -> Self {
		let f1 = if precision + recall > 0.0 {
			2.0 * precision * recall / (precision + recall)
		} else {
			0.0
		};

		Self { precision, recall, f1 }
	}

	fn from_ratios(p_num: f64, p_den: f64, r_num: f64, r_den: f64) -> Self {
		if p_den == 0.0 && r_den == 0.0 {
			return Self::new(1.0, 1.0);
		}

		let precision = if p_den > 0.0 { p_num / p_den } else { 0.0 };
		let recall = if r_den > 0.0 { r_num / r_den } else { 0.0 };

		Self::new(precision, recall)
	}
}

/// Reference scorer computing every metric and reporting the configured one as headline.
#[derive(Debug, Clone, Copy)]
pub struct CorefScorer {
	loss: LossType,
}
impl CorefScorer {
	pub fn new(loss: LossType) -> Self {
		Self { loss }
	}
}
impl Scorer for CorefScorer {
	fn score(&self, predicted: &Partition, gold: &Partition) -> Score {
		let table = Contingency::build(predicted, gold);
		let muc = table.muc();
		let bcubed = table.b_cubed();
		let ceafe = table.ceaf_e();
		let headline = match self.loss {
			LossType::Pairwise => table.pairwise(),
			LossType::Muc => muc,
			LossType::Bcubed => bcubed,
			LossType::CeafE => ceafe,
		};

		Score {
			f1: headline.f1,
			precision: headline.precision,
			recall: headline.recall,
			composite: (muc.f1 + bcubed.f1 + ceafe.f1) / 3.0,
			muc_f1: muc.f1,
			bcubed_f1: bcubed.f1,
			ceafe_f1: ceafe.f1,
		}
	}
}

pub fn pairwise(predicted: &Partition, gold: &Partition) -> Prf {
	Contingency::build(predicted, gold).pairwise()
}

pub fn muc(predicted: &Partition, gold: &Partition) -> Prf {
	Contingency::build(predicted, gold).muc()
}

pub fn b_cubed(predicted: &Partition, gold: &Partition) -> Prf {
	Contingency::build(predicted, gold).b_cubed()
}

pub fn ceaf_e(predicted: &Partition, gold: &Partition) -> Prf {
	Contingency::build(predicted, gold).ceaf_e()
}

pub fn conll(predicted: &Partition, gold: &Partition) -> f64 {
	let table = Contingency::build(predicted, gold);

	(table.muc().f1 + table.b_cubed().f1 + table.ceaf_e().f1) / 3.0
}

/// Cluster sizes on both sides plus the overlap of every (predicted, gold) cluster pair.
///
/// Items present on only one side count towards that side's sizes but never overlap.
struct Contingency {
	predicted_sizes: Vec<usize>,
	gold_sizes: Vec<usize>,
	overlap: BTreeMap<(usize, usize), usize>,
}
impl Contingency {
	fn build(predicted: &Partition, gold: &Partition) -> Self {
		let gold_index: BTreeMap<ClusterId, usize> =
			gold.clusters().enumerate().map(|(index, (id, _))| (id, index)).collect();
		let gold_of = gold.membership();
		let gold_sizes = gold.clusters().map(|(_, items)| items.len()).collect();
		let mut predicted_sizes = Vec::with_capacity(predicted.len());
		let mut overlap = BTreeMap::new();

		for (p_index, (_, items)) in predicted.clusters().enumerate() {
			predicted_sizes.push(items.len());

			for item in items {
				let Some(g_index) = gold_of.get(item).and_then(|id| gold_index.get(id)) else {
					continue;
				};

				*overlap.entry((p_index, *g_index)).or_insert(0) += 1;
			}
		}

		Self { predicted_sizes, gold_sizes, overlap }
	}

	fn pairwise(&self) -> Prf {
		let links = |n: usize| (n * n.saturating_sub(1) / 2) as f64;
		let shared: f64 = self.overlap.values().map(|n| links(*n)).sum();
		let predicted: f64 = self.predicted_sizes.iter().map(|n| links(*n)).sum();
		let gold: f64 = self.gold_sizes.iter().map(|n| links(*n)).sum();

		Prf::from_ratios(shared, predicted, shared, gold)
	}

	fn muc(&self) -> Prf {
		let (r_num, r_den) = muc_side(&self.gold_sizes, self.parts_per_gold());
		let (p_num, p_den) = muc_side(&self.predicted_sizes, self.parts_per_predicted());

		Prf::from_ratios(p_num, p_den, r_num, r_den)
	}

	fn b_cubed(&self) -> Prf {
		let mut precision = 0.0;
		let mut recall = 0.0;

		for ((p, g), n) in &self.overlap {
			let n = *n as f64;

			precision += n * n / self.predicted_sizes[*p] as f64;
			recall += n * n / self.gold_sizes[*g] as f64;
		}

		let p_den = self.predicted_sizes.iter().sum::<usize>() as f64;
		let r_den = self.gold_sizes.iter().sum::<usize>() as f64;

		Prf::from_ratios(precision, p_den, recall, r_den)
	}

	/// Entity-level CEAF with dice similarity and greedy one-to-one alignment.
	fn ceaf_e(&self) -> Prf {
		let mut pairs: Vec<((usize, usize), f64)> = self
			.overlap
			.iter()
			.map(|((p, g), n)| {
				let dice =
					2.0 * *n as f64 / (self.predicted_sizes[*p] + self.gold_sizes[*g]) as f64;

				((*p, *g), dice)
			})
			.collect();

		// Stable sort keeps (predicted, gold) order among equal similarities.
		pairs.sort_by(|lhs, rhs| rhs.1.total_cmp(&lhs.1));

		let mut used_predicted = vec![false; self.predicted_sizes.len()];
		let mut used_gold = vec![false; self.gold_sizes.len()];
		let mut similarity = 0.0;

		for ((p, g), dice) in pairs {
			if used_predicted[p] || used_gold[g] {
				continue;
			}

			used_predicted[p] = true;
			used_gold[g] = true;
			similarity += dice;
		}

		Prf::from_ratios(
			similarity,
			self.predicted_sizes.len() as f64,
			similarity,
			self.gold_sizes.len() as f64,
		)
	}

	fn parts_per_gold(&self) -> Vec<usize> {
		let mut parts = vec![0; self.gold_sizes.len()];
		let mut covered = vec![0; self.gold_sizes.len()];

		for ((_, g), n) in &self.overlap {
			parts[*g] += 1;
			covered[*g] += n;
		}

		// Items missing from the other side each form their own part.
		parts.iter().zip(&covered).zip(&self.gold_sizes).map(|((p, c), s)| p + (s - c)).collect()
	}

	fn parts_per_predicted(&self) -> Vec<usize> {
		let mut parts = vec![0; self.predicted_sizes.len()];
		let mut covered = vec![0; self.predicted_sizes.len()];

		for ((p, _), n) in &self.overlap {
			parts[*p] += 1;
			covered[*p] += n;
		}

		parts
			.iter()
			.zip(&covered)
			.zip(&self.predicted_sizes)
			.map(|((p, c), s)| p + (s - c))
			.collect()
	}
}

fn muc_side(sizes: &[usize], parts: Vec<usize>) -> (f64, f64) {
	let mut numerator = 0.0;
	let mut denominator = 0.0;

	for (size, parts) in sizes.iter().zip(parts) {
		numerator += size.saturating_sub(parts.max(1)) as f64;
		denominator += size.saturating_sub(1) as f64;
	}

	(numerator, denominator)
}
