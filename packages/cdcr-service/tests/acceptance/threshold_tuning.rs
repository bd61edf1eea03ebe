use cdcr_config::StoppingMode;
use cdcr_service::StoppingRateTuner;
use cdcr_storage::{ResultRow, ResultTables, RoundRecord};
use cdcr_testkit::TempExperiment;

use super::{StubClassifier, cosine_weight, stage, stub_dagger};

#[test]
fn tuned_threshold_comes_from_the_grid_and_is_used_for_testing() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");

	stage(&experiment, &["t1", "d1", "t3"]);

	let mut cfg = experiment.config(&["t1"], &["d1"], &["t3"], 2);

	cfg.method.average_weight = false;
	cfg.stopping.mode = StoppingMode::Tuning;
	cfg.stopping.start = 1.0;
	cfg.stopping.end = 3.0;
	cfg.stopping.steps = 10;

	let expected = StoppingRateTuner::new(1.0, 3.0, 10).expect("Valid grid.").grid()[5];
	let mut dagger = stub_dagger(cfg, StubClassifier::new(cosine_weight()));

	dagger.run().expect("Training loop failed.");

	let rounds: Vec<RoundRecord> =
		dagger.tables().read(ResultTables::ROUNDS).expect("Failed to read rounds.");

	assert_eq!(rounds.len(), 2);

	for round in &rounds {
		assert!(
			(round.stopping_threshold - expected).abs() < 1e-12,
			"Unexpected threshold {}.",
			round.stopping_threshold
		);
	}

	let tuning: Vec<ResultRow> =
		dagger.tables().read(ResultTables::TUNING).expect("Failed to read tuning rows.");

	assert_eq!(tuning.len(), 20);
	assert!(tuning.iter().all(|row| row.label.starts_with("threshold=")));

	let testing: Vec<ResultRow> =
		dagger.tables().read(ResultTables::TESTING).expect("Failed to read testing rows.");

	assert!(testing.iter().all(|row| (row.conll_f1 - 1.0).abs() < 1e-9), "{testing:?}");
}
