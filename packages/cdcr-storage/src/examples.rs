//! Aggregated training corpus written by the search engine and read back by the classifier.
//!
//! Every continuing search step produces one file of JSON lines, one line per candidate. A
//! manifest per (topic, epoch, function) lists the step files of that pass, so an empty pass is
//! distinguishable from a lost file.

use std::{
	cmp::Ordering,
	fs::File,
	io::{BufRead, BufReader, BufWriter, Write},
	path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Layout, Result};

/// Phase tags are `function * PHASE_STRIDE`; step files add the step index.
pub const PHASE_STRIDE: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleRow {
	/// 1 on the preferred candidate of the step, 0 elsewhere.
	pub label: u8,
	/// Scorer value against gold; absent when the step was guided by the model alone.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub loss: Option<f64>,
	pub score: f64,
	pub features: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExampleFile {
	pub epoch: u32,
	pub name: String,
	pub rows: Vec<ExampleRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicExamples {
	pub topic: String,
	pub files: Vec<ExampleFile>,
}
impl TopicExamples {
	pub fn file_count(&self) -> usize {
		self.files.len()
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
	topic: String,
	epoch: u32,
	phase: u32,
	files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExampleCorpus {
	layout: Layout,
}
impl ExampleCorpus {
	pub fn new(layout: Layout) -> Self {
		Self { layout }
	}

	/// Writes the file for one step; `file_index` is `phase + step`.
	pub fn write_step(
		&self,
		topic: &str,
		epoch: u32,
		file_index: u32,
		rows: &[ExampleRow],
	) -> Result<()> {
		let path = self.layout.step_file(topic, epoch, file_index);

		crate::ensure_parent(&path)?;

		let file = File::create(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
		let mut writer = BufWriter::new(file);

		for row in rows {
			serde_json::to_writer(&mut writer, row)
				.map_err(|source| Error::Encode { what: path.display().to_string(), source })?;
			writer.write_all(b"\n").map_err(|source| Error::Io { path: path.clone(), source })?;
		}

		writer.flush().map_err(|source| Error::Io { path: path.clone(), source })
	}

	/// Records which step files the pass tagged `phase` produced.
	pub fn write_manifest(
		&self,
		topic: &str,
		epoch: u32,
		phase: u32,
		file_indices: &[u32],
	) -> Result<()> {
		let manifest = Manifest {
			topic: topic.to_string(),
			epoch,
			phase,
			files: file_indices.iter().map(u32::to_string).collect(),
		};

		crate::write_json(&self.layout.manifest(topic, epoch, phase), &manifest)
	}

	/// Every example file of `topic` from epochs `1..=epoch` and functions `1..=function`.
	///
	/// Files come back by epoch, then in numeric name order within each epoch.
	pub fn collect(&self, topic: &str, epoch: u32, function: u32) -> Result<TopicExamples> {
		let mut files = Vec::new();

		for it in 1..=epoch {
			let mut names = Vec::new();

			for jt in 1..=function {
				let path = self.layout.manifest(topic, it, jt * PHASE_STRIDE);
				let manifest: Manifest = crate::read_json(&path).map_err(|err| {
					Error::AggregationIo { topic: topic.to_string(), path, message: err.to_string() }
				})?;

				names.extend(manifest.files);
			}

			sort_numeric(&mut names);
			names.dedup();

			for name in names {
				let path = self.layout.data_dir(topic, it).join(&name);
				let rows = read_rows(topic, &path)?;

				files.push(ExampleFile { epoch: it, name, rows });
			}
		}

		tracing::debug!(topic, epoch, function, files = files.len(), "Example files collected.");

		Ok(TopicExamples { topic: topic.to_string(), files })
	}

	pub fn aggregate(
		&self,
		topics: &[String],
		epoch: u32,
		function: u32,
	) -> Result<Vec<TopicExamples>> {
		topics.iter().map(|topic| self.collect(topic, epoch, function)).collect()
	}
}

/// Orders file names by their numeric value, so `"999" < "1000" < "1002"`.
///
/// Non-numeric names sort after numeric ones, lexicographically.
pub fn sort_numeric(names: &mut [String]) {
	names.sort_by(|lhs, rhs| match (lhs.parse::<u64>(), rhs.parse::<u64>()) {
		(Ok(l), Ok(r)) => l.cmp(&r).then_with(|| lhs.cmp(rhs)),
		(Ok(_), Err(_)) => Ordering::Less,
		(Err(_), Ok(_)) => Ordering::Greater,
		(Err(_), Err(_)) => lhs.cmp(rhs),
	});
}

fn read_rows(topic: &str, path: &Path) -> Result<Vec<ExampleRow>> {
	let aggregation = |message: String| Error::AggregationIo {
		topic: topic.to_string(),
		path: path.to_path_buf(),
		message,
	};
	let file = File::open(path).map_err(|err| aggregation(err.to_string()))?;
	let mut rows = Vec::new();

	for (number, line) in BufReader::new(file).lines().enumerate() {
		let line = line.map_err(|err| aggregation(err.to_string()))?;

		if line.trim().is_empty() {
			continue;
		}

		let row = serde_json::from_str(&line)
			.map_err(|err| aggregation(format!("line {}: {err}", number + 1)))?;

		rows.push(row);
	}

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn numeric_names_sort_by_value() {
		let mut names: Vec<String> =
			["1002", "999", "1000", "notes", "10"].into_iter().map(String::from).collect();

		sort_numeric(&mut names);

		assert_eq!(names, vec!["10", "999", "1000", "1002", "notes"]);
	}
}
