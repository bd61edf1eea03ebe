use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::partition::{ClusterId, ItemId, Partition};

/// One topic's clustering problem: the gold grouping plus the latest prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
	topic: String,
	gold: Partition,
	predicted: Partition,
	#[serde(default)]
	item_features: BTreeMap<ItemId, Vec<f64>>,
}
impl Document {
	/// Starts with every gold item in its own predicted cluster.
	pub fn new(
		topic: impl Into<String>,
		gold: Partition,
		item_features: BTreeMap<ItemId, Vec<f64>>,
	) -> Self {
		let predicted = Partition::singletons(gold.items());

		Self { topic: topic.into(), gold, predicted, item_features }
	}

	pub fn topic(&self) -> &str {
		&self.topic
	}

	pub fn gold(&self) -> &Partition {
		&self.gold
	}

	pub fn predicted(&self) -> &Partition {
		&self.predicted
	}

	pub fn set_predicted(&mut self, predicted: Partition) {
		self.predicted = predicted;
	}

	/// Partition the search starts from.
	pub fn initial_partition(&self) -> Partition {
		Partition::singletons(self.gold.items())
	}

	pub fn item_features(&self, item: ItemId) -> Option<&[f64]> {
		self.item_features.get(&item).map(Vec::as_slice)
	}
}

/// Several documents folded into one scoring unit.
///
/// Each merged document gets its own block of item and cluster ids, so clusters from different
/// topics never collide.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
	gold: Partition,
	predicted: Partition,
	topics: Vec<String>,
	next_item: ItemId,
	next_cluster: ClusterId,
}
impl Corpus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn merge(&mut self, document: &Document) {
		let universe: BTreeSet<ItemId> =
			document.gold().items().chain(document.predicted().items()).collect();
		let mut relabel = BTreeMap::new();

		for item in universe {
			relabel.insert(item, self.next_item);

			self.next_item += 1;
		}

		for (partition, target) in
			[(document.gold(), &mut self.gold), (document.predicted(), &mut self.predicted)]
		{
			for (_, items) in partition.clusters() {
				let items = items.iter().filter_map(|item| relabel.get(item).copied()).collect();

				target.push_cluster(self.next_cluster, items);

				self.next_cluster += 1;
			}
		}

		self.topics.push(document.topic().to_string());
	}

	pub fn gold(&self) -> &Partition {
		&self.gold
	}

	pub fn predicted(&self) -> &Partition {
		&self.predicted
	}

	pub fn documents(&self) -> &[String] {
		&self.topics
	}
}
