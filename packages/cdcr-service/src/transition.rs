use std::collections::BTreeSet;

use cdcr_domain::{Document, ItemId, MergeAction, Partition};

use crate::{Error, Result};

/// One candidate move out of a partition.
#[derive(Debug, Clone)]
pub struct Successor {
	pub action: MergeAction,
	pub partition: Partition,
	pub features: Vec<f64>,
}

/// Enumerates the moves available from a partition and describes each with a feature vector.
///
/// Implementations must be deterministic. A failed element drops that candidate only.
pub trait Transition {
	fn feature_len(&self) -> usize;

	fn successors(&self, partition: &Partition, document: &Document) -> Vec<Result<Successor>>;
}

/// Merges every unordered pair of clusters, lower id surviving.
///
/// Features per candidate: the elementwise product of the two cluster centroids, their cosine
/// similarity, a constant bias and the log of the merged cluster size.
#[derive(Debug, Clone, Copy)]
pub struct PairwiseMergeTransition {
	item_dim: usize,
}
impl PairwiseMergeTransition {
	pub fn new(item_dim: usize) -> Self {
		Self { item_dim }
	}

	fn centroid(&self, items: &BTreeSet<ItemId>, document: &Document) -> Result<Vec<f64>> {
		let mut sum = vec![0.0; self.item_dim];

		for item in items {
			let vector = document.item_features(*item).ok_or_else(|| Error::Features {
				message: format!("topic {:?} has no attributes for item {item}", document.topic()),
			})?;

			if vector.len() != self.item_dim {
				return Err(Error::Features {
					message: format!(
						"item {item} of topic {:?} has {} attributes, expected {}",
						document.topic(),
						vector.len(),
						self.item_dim
					),
				});
			}

			for (total, value) in sum.iter_mut().zip(vector) {
				*total += value;
			}
		}

		let count = items.len().max(1) as f64;

		Ok(sum.into_iter().map(|total| total / count).collect())
	}

	fn describe(
		&self,
		partition: &Partition,
		document: &Document,
		action: MergeAction,
		into: &BTreeSet<ItemId>,
		from: &BTreeSet<ItemId>,
	) -> Result<Successor> {
		let lhs = self.centroid(into, document)?;
		let rhs = self.centroid(from, document)?;
		let mut features: Vec<f64> = lhs.iter().zip(&rhs).map(|(l, r)| l * r).collect();

		features.push(cosine(&lhs, &rhs));
		features.push(1.0);
		features.push(((into.len() + from.len()) as f64).ln());

		let partition = partition.merge(action.into, action.from)?;

		Ok(Successor { action, partition, features })
	}
}
impl Transition for PairwiseMergeTransition {
	fn feature_len(&self) -> usize {
		self.item_dim + 3
	}

	fn successors(&self, partition: &Partition, document: &Document) -> Vec<Result<Successor>> {
		let clusters: Vec<_> = partition.clusters().collect();
		let mut out = Vec::with_capacity(clusters.len() * clusters.len().saturating_sub(1) / 2);

		for (index, (into, into_items)) in clusters.iter().enumerate() {
			for (from, from_items) in &clusters[index + 1..] {
				let action = MergeAction { into: *into, from: *from };

				out.push(self.describe(partition, document, action, into_items, from_items));
			}
		}

		out
	}
}

fn cosine(lhs: &[f64], rhs: &[f64]) -> f64 {
	let dot: f64 = lhs.iter().zip(rhs).map(|(l, r)| l * r).sum();
	let norm = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>().sqrt();
	let denom = norm(lhs) * norm(rhs);

	if denom == 0.0 { 0.0 } else { dot / denom }
}
