use cdcr_domain::Parameter;
use cdcr_storage::{CheckpointStore, FsCheckpointStore, Layout, ResultRow, ResultTables, RoundRecord};
use cdcr_testkit::TempExperiment;

use super::stage;

#[test]
fn reference_loop_records_every_round() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");

	stage(&experiment, &["t1", "t2", "t3"]);

	let mut cfg = experiment.config(&["t1", "t2"], &[], &["t3"], 2);

	cfg.method.epochs = 2;

	let mut dagger = cdcr_service::reference_dagger(cfg).expect("Failed to build training loop.");
	let models = dagger.run().expect("Training loop failed.");

	assert_eq!(models.len(), 4);
	assert!(models.iter().all(|model| model.len() == 5));

	let rounds: Vec<RoundRecord> =
		dagger.tables().read(ResultTables::ROUNDS).expect("Failed to read rounds.");
	let order: Vec<(u32, u32)> = rounds.iter().map(|round| (round.epoch, round.function)).collect();

	assert_eq!(order, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
	// One oracle step per training topic in the first round.
	assert_eq!(rounds[0].aggregated_files, 2);
	assert!(rounds[1].aggregated_files >= rounds[0].aggregated_files);
	assert!(rounds.iter().all(|round| round.stopping_threshold == 0.0));

	let training: Vec<ResultRow> =
		dagger.tables().read(ResultTables::TRAINING).expect("Failed to read training rows.");
	let testing: Vec<ResultRow> =
		dagger.tables().read(ResultTables::TESTING).expect("Failed to read testing rows.");

	assert_eq!(training.len(), 4);
	assert_eq!(testing.len(), 4);
	// The oracle pass reproduces gold exactly.
	assert_eq!(training[0].label, "training");
	assert!((training[0].stanford_f1 - 1.0).abs() < 1e-9, "Oracle pass scored {training:?}.");

	let checkpoints = FsCheckpointStore::new(experiment.result_dir());

	for (index, model) in models.iter().enumerate() {
		let stored: Parameter = checkpoints
			.load(&format!("model/{}", index + 1))
			.expect("Every round checkpoints its model.");

		assert_eq!(stored.violations(), model.violations());
		assert!(
			stored.weight().iter().zip(model.weight()).all(|(lhs, rhs)| (lhs - rhs).abs() < 1e-9),
			"Checkpoint {} differs from the returned model.",
			index + 1
		);
	}

	let layout = Layout::new(experiment.result_dir());

	assert!(layout.phase_output("training", 1, 1).is_file());
	assert!(layout.phase_output("testing", 2, 2).is_file());
}

#[test]
fn validation_pass_is_recorded_after_the_last_function() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");

	stage(&experiment, &["t1", "t3"]);

	let mut cfg = experiment.config(&["t1"], &[], &["t3"], 2);

	cfg.method.validate_on_training = true;

	let mut dagger = cdcr_service::reference_dagger(cfg).expect("Failed to build training loop.");

	dagger.run().expect("Training loop failed.");

	let training: Vec<ResultRow> =
		dagger.tables().read(ResultTables::TRAINING).expect("Failed to read training rows.");
	let labels: Vec<(&str, u32)> =
		training.iter().map(|row| (row.label.as_str(), row.function)).collect();

	assert_eq!(labels, vec![("training", 1), ("training", 2), ("validation", 3)]);
}
