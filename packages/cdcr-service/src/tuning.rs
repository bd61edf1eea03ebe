use cdcr_domain::{Corpus, Document, Scorer, descending_grid};
use cdcr_storage::{ResultRow, ResultTables};

use crate::{
	Result,
	search::{Phase, SearchEngine},
	transition::Transition,
};

/// Picks the stopping threshold that maximizes the composite score on held-out documents.
#[derive(Debug, Clone)]
pub struct StoppingRateTuner {
	grid: Vec<f64>,
}
impl StoppingRateTuner {
	pub fn new(start: f64, end: f64, steps: i64) -> Result<Self> {
		Ok(Self { grid: descending_grid(start, end, steps)? })
	}

	pub fn grid(&self) -> &[f64] {
		&self.grid
	}

	/// Runs testing search at every grid threshold and returns the best one.
	///
	/// Ties keep the earlier, larger threshold. Every evaluation is appended to the tuning table.
	pub fn tune<T, S>(
		&self,
		engine: &SearchEngine<T, S>,
		documents: &mut [Document],
		weight: &[f64],
		phase: Phase,
		tables: &ResultTables,
	) -> Result<f64>
	where
		T: Transition,
		S: Scorer,
	{
		let mut best: Option<(f64, f64)> = None;

		for &threshold in &self.grid {
			let mut corpus = Corpus::new();

			for document in documents.iter_mut() {
				let outcome = engine.testing_by_search(document, weight, phase, false, threshold)?;

				document.set_predicted(outcome.partition);
				corpus.merge(document);
			}

			let score = engine.scorer().score(corpus.predicted(), corpus.gold());

			tables.append(
				ResultTables::TUNING,
				&ResultRow::new(
					format!("threshold={threshold}"),
					phase.epoch,
					phase.function,
					&score,
				),
			)?;

			tracing::debug!(threshold, composite = score.composite, "Threshold evaluated.");

			if best.is_none_or(|(_, composite)| score.composite > composite) {
				best = Some((threshold, score.composite));
			}
		}

		let (threshold, composite) =
			best.unwrap_or((self.grid.first().copied().unwrap_or_default(), 0.0));

		tracing::info!(
			epoch = phase.epoch,
			function = phase.function,
			threshold,
			composite,
			"Stopping threshold tuned."
		);

		Ok(threshold)
	}
}
