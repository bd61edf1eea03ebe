use std::{cell::Cell, fs};

use cdcr_config::{BestStateCriterion, LossType};
use cdcr_domain::{
	ClusterId, CorefScorer, Document, MergeAction, Parameter, Partition, Score, Scorer,
};
use cdcr_service::{
	PairwiseMergeTransition, Phase, Result, SearchEngine, SearchSettings, StoppingRateTuner,
	Successor, Transition,
};
use cdcr_storage::{ExampleCorpus, ExampleRow, Layout, ResultRow, ResultTables};
use cdcr_testkit::{ExactMatchScorer, TempExperiment, fixture_document};

/// Only ever joins two singleton clusters; every move has the same single feature.
struct SingletonMergeTransition;
impl Transition for SingletonMergeTransition {
	fn feature_len(&self) -> usize {
		1
	}

	fn successors(&self, partition: &Partition, _document: &Document) -> Vec<Result<Successor>> {
		let singletons: Vec<ClusterId> =
			partition.clusters().filter(|(_, items)| items.len() == 1).map(|(id, _)| id).collect();
		let mut out = Vec::new();

		for (index, into) in singletons.iter().enumerate() {
			for from in &singletons[index + 1..] {
				let action = MergeAction { into: *into, from: *from };

				out.push(
					partition
						.merge(*into, *from)
						.map(|partition| Successor { action, partition, features: vec![1.0] })
						.map_err(Into::into),
				);
			}
		}

		out
	}
}

fn settings(width: usize) -> SearchSettings {
	SearchSettings { width, max_steps: 50, best_state: BestStateCriterion::ModelScore }
}

fn corpus(experiment: &TempExperiment) -> ExampleCorpus {
	ExampleCorpus::new(Layout::new(experiment.result_dir()))
}

fn read_rows(experiment: &TempExperiment, topic: &str, epoch: u32, file: &str) -> Vec<ExampleRow> {
	let path = Layout::new(experiment.result_dir()).data_dir(topic, epoch).join(file);
	let raw = fs::read_to_string(&path).expect("Failed to read example file.");

	raw.lines().map(|line| serde_json::from_str(line).expect("Malformed example row.")).collect()
}

/// Counts gold comparisons made through the search engine.
#[derive(Default)]
struct CountingScorer {
	calls: Cell<usize>,
}
impl Scorer for CountingScorer {
	fn score(&self, predicted: &Partition, gold: &Partition) -> Score {
		self.calls.set(self.calls.get() + 1);

		CorefScorer::new(LossType::Pairwise).score(predicted, gold)
	}
}

fn assert_close(actual: &[f64], expected: &[f64]) {
	assert_eq!(actual.len(), expected.len());

	for (index, (actual, expected)) in actual.iter().zip(expected).enumerate() {
		assert!((actual - expected).abs() < 1e-9, "Slot {index}: {actual} != {expected}.");
	}
}

/// Cosine-driven weights: joining identical items gains 2, anything else loses.
fn cosine_weight() -> Vec<f64> {
	vec![0.0, 0.0, 10.0, -8.0, 0.0]
}

#[test]
fn oracle_search_reproduces_gold_without_violations() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		SingletonMergeTransition,
		ExactMatchScorer,
		settings(4),
		corpus(&experiment),
	);
	let mut parameter = Parameter::new(1);

	for topic in ["t1", "t3"] {
		let mut document = fixture_document(topic, &[&[1, 2]], 2).expect("Valid fixture.");
		let outcome = engine
			.training_by_search(&document, &mut parameter, Phase::new(1, 1))
			.expect("Search must succeed.");

		document.set_predicted(outcome.partition);

		assert!(document.predicted().same_grouping(document.gold()), "Topic {topic} diverged.");
		assert_eq!(outcome.steps, 1);
	}

	assert_eq!(parameter.violations(), 0);

	let examples = engine.examples().collect("t3", 1, 1).expect("Examples were written.");

	assert_eq!(examples.file_count(), 1);
	assert_eq!(examples.files[0].name, "1000");
	assert_eq!(examples.files[0].rows[0].label, 1);
}

#[test]
fn oracle_search_follows_the_loss_through_a_beam() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(3),
		CorefScorer::new(LossType::Pairwise),
		settings(3),
		corpus(&experiment),
	);
	let document =
		fixture_document("t5", &[&[1, 2], &[3, 4], &[5]], 3).expect("Valid fixture.");
	let mut parameter = Parameter::new(6);
	let outcome = engine
		.training_by_search(&document, &mut parameter, Phase::new(1, 1))
		.expect("Search must succeed.");

	assert!(outcome.partition.same_grouping(document.gold()));
	assert_eq!(outcome.steps, 2);
	assert_eq!(outcome.best.depth(), 2);

	// The zero model keeps the first candidate of the second step, joining {1, 2} with {3},
	// instead of joining 3 and 4. Product of centroids, cosine, bias and log size differ.
	let delta = [0.0, 1.0, 0.0, 1.0, 0.0, 2.0_f64.ln() - 3.0_f64.ln()];

	assert_eq!(parameter.violations(), 1);
	assert_close(parameter.weight(), &delta);
	assert_close(parameter.total_weight(), &delta);

	let rows = read_rows(&experiment, "t5", 1, "1001");

	assert_eq!(rows.iter().filter(|row| row.label == 1).count(), 1);
	assert!(rows.iter().all(|row| row.features.len() == 6));
}

#[test]
fn equally_good_favourite_is_not_a_violation() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CorefScorer::new(LossType::Pairwise),
		settings(2),
		corpus(&experiment),
	);
	let document = fixture_document("t7", &[&[1, 2], &[3, 4]], 2).expect("Valid fixture.");
	// Prefers joining items whose second attribute is set: 3 and 4 before 1 and 2.
	let weight = vec![0.0, 5.0, 0.0, 0.0, 0.0];
	let mut parameter = Parameter::from_weight(weight.clone());
	let outcome = engine
		.training_by_search(&document, &mut parameter, Phase::new(1, 1))
		.expect("Search must succeed.");

	assert!(outcome.partition.same_grouping(document.gold()));
	assert_eq!(outcome.steps, 2);
	assert_eq!(parameter.violations(), 0);
	assert_eq!(parameter.weight(), weight.as_slice());
	assert_eq!(parameter.total_weight(), &[0.0; 5]);

	// Joining 1 and 2 comes first and is as good as joining 3 and 4; the model's pick is labelled.
	let rows = read_rows(&experiment, "t7", 1, "1000");
	let labelled: Vec<usize> =
		rows.iter().enumerate().filter(|(_, row)| row.label == 1).map(|(index, _)| index).collect();

	assert_eq!(labelled, vec![5]);
	assert_eq!(rows[0].loss, rows[5].loss);
	assert!((rows[5].score - 5.0).abs() < 1e-9);
}

#[test]
fn model_guided_emission_never_consults_gold() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CountingScorer::default(),
		settings(3),
		corpus(&experiment),
	);
	let document = fixture_document("t8", &[&[1, 2], &[3]], 2).expect("Valid fixture.");
	let outcome = engine
		.testing_by_search(&document, &cosine_weight(), Phase::new(1, 2), true, 0.0)
		.expect("Search must succeed.");

	assert_eq!(outcome.steps, 1);
	assert_eq!(engine.scorer().calls.get(), 0);

	let rows = read_rows(&experiment, "t8", 1, "2000");

	assert_eq!(rows.len(), 3);
	assert!(rows.iter().all(|row| row.loss.is_none()));

	let true_loss = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CountingScorer::default(),
		SearchSettings { width: 3, max_steps: 50, best_state: BestStateCriterion::TrueLoss },
		corpus(&experiment),
	);

	true_loss
		.testing_by_search(&document, &cosine_weight(), Phase::new(1, 3), false, 0.0)
		.expect("Search must succeed.");

	assert!(true_loss.scorer().calls.get() > 0, "The true-loss criterion scores against gold.");
}

#[test]
fn high_threshold_returns_the_initial_state() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CorefScorer::new(LossType::Pairwise),
		settings(5),
		corpus(&experiment),
	);
	let document = fixture_document("t2", &[&[1, 2], &[3]], 2).expect("Valid fixture.");
	let outcome = engine
		.testing_by_search(&document, &[1.0; 5], Phase::new(1, 1), false, 1e9)
		.expect("Search must succeed.");

	assert_eq!(outcome.steps, 0);
	assert_eq!(outcome.best.depth(), 0);
	assert_eq!(outcome.partition, document.initial_partition());
}

#[test]
fn testing_search_emits_model_labelled_examples() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CorefScorer::new(LossType::Pairwise),
		settings(3),
		corpus(&experiment),
	);
	let document = fixture_document("t4", &[&[1, 2], &[3]], 2).expect("Valid fixture.");
	let outcome = engine
		.testing_by_search(&document, &cosine_weight(), Phase::new(2, 3), true, 0.0)
		.expect("Search must succeed.");

	assert!(outcome.partition.same_grouping(document.gold()));
	assert_eq!(outcome.steps, 1);
	assert!((outcome.best.score() - 2.0).abs() < 1e-9);

	let rows = read_rows(&experiment, "t4", 2, "3000");
	let labels: Vec<u8> = rows.iter().map(|row| row.label).collect();

	assert_eq!(labels, vec![1, 0, 0]);
	assert!(rows.iter().all(|row| row.loss.is_none()), "Model-guided rows carry no loss.");

	let examples = engine.examples().collect("t4", 2, 3);

	assert!(
		examples.is_err(),
		"Earlier passes never ran, so aggregation must fail."
	);
}

#[test]
fn true_loss_criterion_picks_the_best_state_by_gold() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CorefScorer::new(LossType::Pairwise),
		SearchSettings { width: 3, max_steps: 50, best_state: BestStateCriterion::TrueLoss },
		corpus(&experiment),
	);
	let document = fixture_document("t6", &[&[1, 2], &[3]], 2).expect("Valid fixture.");
	// Every merge looks good to this model, so search runs to a single cluster.
	let outcome = engine
		.testing_by_search(&document, &[0.0, 0.0, 0.0, 1.0, 0.0], Phase::new(1, 1), false, 0.0)
		.expect("Search must succeed.");

	assert_eq!(outcome.steps, 2);
	assert!(outcome.partition.same_grouping(document.gold()));
}

#[test]
fn tuner_picks_a_grid_threshold_that_lets_good_merges_through() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");
	let engine = SearchEngine::new(
		PairwiseMergeTransition::new(2),
		CorefScorer::new(LossType::Pairwise),
		settings(3),
		corpus(&experiment),
	);
	let tables = ResultTables::new(Layout::new(experiment.result_dir()));
	let tuner = StoppingRateTuner::new(1.0, 3.0, 10).expect("Valid grid.");
	let mut documents = vec![
		fixture_document("d1", &[&[1, 2], &[3]], 2).expect("Valid fixture."),
		fixture_document("d2", &[&[7, 8], &[9]], 2).expect("Valid fixture."),
	];
	let threshold = tuner
		.tune(&engine, &mut documents, &cosine_weight(), Phase::new(1, 2), &tables)
		.expect("Tuning must succeed.");

	assert_eq!(tuner.grid().len(), 10);
	assert!(tuner.grid().contains(&threshold));
	// Merges gain exactly 2.0; the first grid value at or below it wins.
	assert_eq!(threshold, tuner.grid()[5]);
	assert!(documents.iter().all(|document| document.predicted().same_grouping(document.gold())));

	let rows: Vec<ResultRow> = tables.read(ResultTables::TUNING).expect("Read tuning table.");

	assert_eq!(rows.len(), 10);
	assert!(rows.iter().all(|row| row.epoch == 1 && row.function == 2));
}

#[test]
fn degenerate_grid_is_rejected() {
	assert!(matches!(
		StoppingRateTuner::new(2.0, 2.0, 4),
		Err(cdcr_service::Error::DegenerateGrid { .. })
	));
}
