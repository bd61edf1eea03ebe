//! Fixed-capacity ranked collection used as the search frontier.
//!
//! Ordering rules:
//! - At capacity, a candidate must beat the current minimum strictly to get in.
//! - Among equal minima the most recently inserted entry is evicted, so earlier entries win ties.
//! - `best` breaks ties in favour of the earliest insertion.
//! - NaN priorities rank below every real number.

use std::cmp::Ordering;

use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Entry<T> {
	item: T,
	priority: f64,
	seq: u64,
}
impl<T> Entry<T> {
	/// Descending priority, then ascending insertion order.
	fn rank(&self, other: &Self) -> Ordering {
		other.priority.total_cmp(&self.priority).then(self.seq.cmp(&other.seq))
	}
}

#[derive(Debug, Clone)]
pub struct Beam<T> {
	capacity: usize,
	entries: Vec<Entry<T>>,
	next_seq: u64,
}
impl<T> Beam<T> {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);

		Self { capacity, entries: Vec::with_capacity(capacity), next_seq: 0 }
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn is_full(&self) -> bool {
		self.entries.len() >= self.capacity
	}

	/// Offers a candidate; returns whether it was retained.
	pub fn insert(&mut self, item: T, priority: f64) -> bool {
		let priority = if priority.is_nan() { f64::NEG_INFINITY } else { priority };
		let seq = self.next_seq;

		self.next_seq += 1;

		if !self.is_full() {
			self.entries.push(Entry { item, priority, seq });

			return true;
		}

		let Some(victim) = self.eviction_index() else { return false };

		if priority <= self.entries[victim].priority {
			return false;
		}

		self.entries[victim] = Entry { item, priority, seq };

		true
	}

	/// Lowest retained priority, if any.
	pub fn min_priority(&self) -> Option<f64> {
		self.eviction_index().map(|index| self.entries[index].priority)
	}

	pub fn best(&self) -> Result<(&T, f64)> {
		self.entries
			.iter()
			.min_by(|lhs, rhs| lhs.rank(rhs))
			.map(|entry| (&entry.item, entry.priority))
			.ok_or(Error::EmptyBeam)
	}

	/// Retained items and their priorities, best first.
	pub fn to_list(&self) -> (Vec<&T>, Vec<f64>) {
		let mut ordered: Vec<&Entry<T>> = self.entries.iter().collect();

		ordered.sort_by(|lhs, rhs| lhs.rank(rhs));

		ordered.into_iter().map(|entry| (&entry.item, entry.priority)).unzip()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
		self.entries.iter().map(|entry| (&entry.item, entry.priority))
	}

	/// Empties the beam, yielding entries best first.
	pub fn drain(&mut self) -> Vec<(T, f64)> {
		let mut entries = std::mem::take(&mut self.entries);

		entries.sort_by(|lhs, rhs| lhs.rank(rhs));

		entries.into_iter().map(|entry| (entry.item, entry.priority)).collect()
	}

	fn eviction_index(&self) -> Option<usize> {
		let mut victim: Option<usize> = None;

		for (index, entry) in self.entries.iter().enumerate() {
			let replace = match victim {
				None => true,
				Some(current) => {
					let current = &self.entries[current];

					entry.priority < current.priority
						|| (entry.priority == current.priority && entry.seq > current.seq)
				},
			};

			if replace {
				victim = Some(index);
			}
		}

		victim
	}
}
