use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type ItemId = u32;
pub type ClusterId = u32;

type ClusterMap = BTreeMap<ClusterId, BTreeSet<ItemId>>;

/// Disjoint, non-empty clusters over a fixed item universe.
///
/// Ordered maps keep iteration (and therefore search) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClusterMap", into = "ClusterMap")]
pub struct Partition {
	clusters: ClusterMap,
}
impl Partition {
	/// One cluster per item; the cluster id is the item id.
	pub fn singletons<I>(items: I) -> Self
	where
		I: IntoIterator<Item = ItemId>,
	{
		let clusters = items.into_iter().map(|item| (item, BTreeSet::from([item]))).collect();

		Self { clusters }
	}

	/// Builds a partition from groups of items, numbering clusters by position.
	pub fn from_groups<I, G>(groups: I) -> Result<Self>
	where
		I: IntoIterator<Item = G>,
		G: IntoIterator<Item = ItemId>,
	{
		let mut clusters = ClusterMap::new();

		for (index, group) in groups.into_iter().enumerate() {
			let id = ClusterId::try_from(index).map_err(|_| Error::InvalidPartition {
				message: "too many clusters".to_string(),
			})?;

			clusters.insert(id, group.into_iter().collect());
		}

		Self::try_from(clusters)
	}

	pub fn len(&self) -> usize {
		self.clusters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clusters.is_empty()
	}

	pub fn item_count(&self) -> usize {
		self.clusters.values().map(BTreeSet::len).sum()
	}

	/// True once no further merge is possible.
	pub fn is_single_cluster(&self) -> bool {
		self.clusters.len() <= 1
	}

	pub fn clusters(&self) -> impl Iterator<Item = (ClusterId, &BTreeSet<ItemId>)> {
		self.clusters.iter().map(|(id, items)| (*id, items))
	}

	pub fn cluster(&self, id: ClusterId) -> Option<&BTreeSet<ItemId>> {
		self.clusters.get(&id)
	}

	pub fn cluster_of(&self, item: ItemId) -> Option<ClusterId> {
		self.clusters.iter().find(|(_, items)| items.contains(&item)).map(|(id, _)| *id)
	}

	pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
		self.clusters.values().flat_map(|items| items.iter().copied())
	}

	/// Item to cluster lookup table, built once per scoring call.
	pub fn membership(&self) -> BTreeMap<ItemId, ClusterId> {
		self.clusters
			.iter()
			.flat_map(|(id, items)| items.iter().map(move |item| (*item, *id)))
			.collect()
	}

	/// Returns a new partition where `from` has been folded into `into`.
	pub fn merge(&self, into: ClusterId, from: ClusterId) -> Result<Self> {
		if into == from {
			return Err(Error::InvalidPartition {
				message: format!("cannot merge cluster {into} with itself"),
			});
		}

		let moved = self.clusters.get(&from).ok_or(Error::UnknownCluster { cluster: from })?;

		if !self.clusters.contains_key(&into) {
			return Err(Error::UnknownCluster { cluster: into });
		}

		let mut clusters = self.clusters.clone();

		clusters.remove(&from);

		if let Some(target) = clusters.get_mut(&into) {
			target.extend(moved.iter().copied());
		}

		Ok(Self { clusters })
	}

	/// Cluster contents without ids, ordered by each cluster's smallest item.
	pub fn groups(&self) -> Vec<Vec<ItemId>> {
		let mut groups: Vec<Vec<ItemId>> =
			self.clusters.values().map(|items| items.iter().copied().collect()).collect();

		groups.sort();

		groups
	}

	/// Equality of the grouping, ignoring how clusters are numbered.
	pub fn same_grouping(&self, other: &Self) -> bool {
		self.len() == other.len() && self.groups() == other.groups()
	}

	pub(crate) fn push_cluster(&mut self, id: ClusterId, items: BTreeSet<ItemId>) {
		self.clusters.insert(id, items);
	}
}
impl TryFrom<ClusterMap> for Partition {
	type Error = Error;

	fn try_from(clusters: ClusterMap) -> Result<Self> {
		let mut seen = BTreeSet::new();

		for (id, items) in &clusters {
			if items.is_empty() {
				return Err(Error::InvalidPartition { message: format!("cluster {id} is empty") });
			}

			for item in items {
				if !seen.insert(*item) {
					return Err(Error::InvalidPartition {
						message: format!("item {item} appears in more than one cluster"),
					});
				}
			}
		}

		Ok(Self { clusters })
	}
}
impl From<Partition> for ClusterMap {
	fn from(partition: Partition) -> Self {
		partition.clusters
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_folds_source_into_target() {
		let partition = Partition::singletons([1, 2, 3]);
		let merged = partition.merge(1, 3).expect("Merge must succeed.");

		assert_eq!(merged.len(), 2);
		assert_eq!(merged.cluster(1), Some(&BTreeSet::from([1, 3])));
		assert_eq!(merged.cluster_of(3), Some(1));
		assert_eq!(partition.len(), 3, "Merging must not mutate the source partition.");
	}

	#[test]
	fn merge_rejects_unknown_and_self_merges() {
		let partition = Partition::singletons([1, 2]);

		assert!(matches!(partition.merge(1, 9), Err(Error::UnknownCluster { cluster: 9 })));
		assert!(matches!(partition.merge(9, 1), Err(Error::UnknownCluster { cluster: 9 })));
		assert!(partition.merge(2, 2).is_err());
	}

	#[test]
	fn overlapping_groups_are_rejected() {
		let err = Partition::from_groups([vec![1, 2], vec![2, 3]]).expect_err("Overlap expected.");

		assert!(err.to_string().contains("item 2"), "Unexpected error: {err}");
		assert!(Partition::from_groups([Vec::<ItemId>::new()]).is_err());
	}

	#[test]
	fn same_grouping_ignores_cluster_ids() {
		let lhs = Partition::from_groups([vec![1, 2], vec![3]]).expect("Valid partition.");
		let rhs = Partition::singletons([1, 2, 3]).merge(2, 1).expect("Merge must succeed.");

		assert_ne!(lhs, rhs);
		assert!(lhs.same_grouping(&rhs));
		assert!(!lhs.same_grouping(&Partition::singletons([1, 2, 3])));
	}
}
