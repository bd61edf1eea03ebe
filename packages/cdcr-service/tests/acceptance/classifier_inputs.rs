use cdcr_testkit::TempExperiment;

use super::{StubClassifier, TrainCall, cosine_weight, stage, stub_dagger};

#[test]
fn each_round_trains_on_everything_aggregated_so_far() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");

	stage(&experiment, &["t1", "t2", "t3"]);

	let mut cfg = experiment.config(&["t1", "t2"], &[], &["t3"], 2);

	cfg.method.epochs = 2;
	cfg.method.average_weight = false;

	let classifier = StubClassifier::new(cosine_weight());
	let calls = classifier.calls.clone();
	let mut dagger = stub_dagger(cfg, classifier);
	let models = dagger.run().expect("Training loop failed.");

	assert!(models.iter().all(|model| model.weight() == cosine_weight().as_slice()));

	let calls = calls.lock().expect("Poisoned call log.").clone();
	let call = |function, files| TrainCall { function, files };

	// Oracle and model passes each stop after one merge per topic, so every pass adds two files.
	// Epoch 2 function 1 sees epoch 1 function 1 only.
	assert_eq!(calls, vec![call(1, 2), call(2, 4), call(1, 4), call(2, 8)]);
}
