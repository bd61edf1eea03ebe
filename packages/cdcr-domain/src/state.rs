use std::fmt;

use serde::{Deserialize, Serialize};

use crate::partition::{ClusterId, Partition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAction {
	pub into: ClusterId,
	pub from: ClusterId,
}
impl fmt::Display for MergeAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}<-{}", self.into, self.from)
	}
}

/// Snapshot of one point in the search space.
///
/// States are never mutated once built; a transition yields a new state that carries
/// the parent's provenance plus the action taken.
#[derive(Debug, Clone)]
pub struct SearchState {
	partition: Partition,
	score: f64,
	provenance: Vec<MergeAction>,
}
impl SearchState {
	pub fn initial(partition: Partition, score: f64) -> Self {
		Self { partition, score, provenance: Vec::new() }
	}

	pub fn successor(&self, action: MergeAction, partition: Partition, score: f64) -> Self {
		let mut provenance = Vec::with_capacity(self.provenance.len() + 1);

		provenance.extend_from_slice(&self.provenance);
		provenance.push(action);

		Self { partition, score, provenance }
	}

	pub fn partition(&self) -> &Partition {
		&self.partition
	}

	pub fn into_partition(self) -> Partition {
		self.partition
	}

	pub fn score(&self) -> f64 {
		self.score
	}

	pub fn provenance(&self) -> &[MergeAction] {
		&self.provenance
	}

	/// Number of merges applied since the initial state.
	pub fn depth(&self) -> usize {
		self.provenance.len()
	}
}
impl fmt::Display for SearchState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "score={:.4} clusters={} path=[", self.score, self.partition.len())?;

		for (index, action) in self.provenance.iter().enumerate() {
			if index > 0 {
				f.write_str(", ")?;
			}

			write!(f, "{action}")?;
		}

		f.write_str("]")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn successors_extend_provenance_without_touching_the_parent() {
		let root = SearchState::initial(Partition::singletons([1, 2, 3]), 0.0);
		let first = MergeAction { into: 1, from: 2 };
		let second = MergeAction { into: 1, from: 3 };
		let child =
			root.successor(first, root.partition().merge(1, 2).expect("Merge must succeed."), 0.5);
		let grandchild =
			child.successor(second, child.partition().merge(1, 3).expect("Merge must succeed."), 0.7);

		assert_eq!(root.depth(), 0);
		assert_eq!(child.provenance(), &[first]);
		assert_eq!(grandchild.provenance(), &[first, second]);
		assert!(grandchild.partition().is_single_cluster());
		assert_eq!(grandchild.to_string(), "score=0.7000 clusters=1 path=[1<-2, 1<-3]");
	}
}
