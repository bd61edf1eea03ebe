use std::{
	fs::File,
	io::{BufRead, BufReader},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;

use cdcr_domain::Score;

use crate::{Error, Layout, Result};

/// Scores of one evaluation pass, one line in a result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
	pub label: String,
	pub epoch: u32,
	pub function: u32,
	pub stanford_f1: f64,
	pub precision: f64,
	pub recall: f64,
	pub muc_f1: f64,
	pub bcubed_f1: f64,
	pub ceafe_f1: f64,
	pub conll_f1: f64,
	#[serde(with = "crate::timestamp")]
	pub time: OffsetDateTime,
}
impl ResultRow {
	pub fn new(label: impl Into<String>, epoch: u32, function: u32, score: &Score) -> Self {
		Self {
			label: label.into(),
			epoch,
			function,
			stanford_f1: score.f1,
			precision: score.precision,
			recall: score.recall,
			muc_f1: score.muc_f1,
			bcubed_f1: score.bcubed_f1,
			ceafe_f1: score.ceafe_f1,
			conll_f1: score.composite,
			time: OffsetDateTime::now_utc(),
		}
	}
}

/// Bookkeeping for one completed (epoch, function) round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
	pub epoch: u32,
	pub function: u32,
	pub aggregated_files: usize,
	pub stopping_threshold: f64,
	pub violations: u64,
	#[serde(with = "crate::timestamp")]
	pub time: OffsetDateTime,
}
impl RoundRecord {
	pub fn new(
		epoch: u32,
		function: u32,
		aggregated_files: usize,
		stopping_threshold: f64,
		violations: u64,
	) -> Self {
		Self {
			epoch,
			function,
			aggregated_files,
			stopping_threshold,
			violations,
			time: OffsetDateTime::now_utc(),
		}
	}
}

/// Append-only JSON-lines tables under `<root>/results/`.
#[derive(Debug, Clone)]
pub struct ResultTables {
	layout: Layout,
}
impl ResultTables {
	pub const TRAINING: &'static str = "trainingset";
	pub const TUNING: &'static str = "tuning";
	pub const TESTING: &'static str = "testingset";
	pub const ROUNDS: &'static str = "rounds";

	pub fn new(layout: Layout) -> Self {
		Self { layout }
	}

	pub fn append<T>(&self, table: &str, row: &T) -> Result<()>
	where
		T: Serialize,
	{
		crate::append_json_line(&self.layout.result_table(table), row)
	}

	/// Reads a whole table back; a table never written to is empty.
	pub fn read<T>(&self, table: &str) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let path = self.layout.result_table(table);

		if !path.exists() {
			return Ok(Vec::new());
		}

		let file = File::open(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
		let mut rows = Vec::new();

		for line in BufReader::new(file).lines() {
			let line = line.map_err(|source| Error::Io { path: path.clone(), source })?;

			if line.trim().is_empty() {
				continue;
			}

			rows.push(
				serde_json::from_str(&line)
					.map_err(|source| Error::Decode { path: path.clone(), source })?,
			);
		}

		Ok(rows)
	}
}
