use cdcr_service::Error;
use cdcr_testkit::TempExperiment;

use super::stage;

#[test]
fn missing_training_document_aborts_the_first_round() {
	let experiment = TempExperiment::new().expect("Failed to create experiment.");

	stage(&experiment, &["t1", "t3"]);

	let cfg = experiment.config(&["t1", "ghost"], &[], &["t3"], 2);
	let mut dagger = cdcr_service::reference_dagger(cfg).expect("Failed to build training loop.");
	let err = dagger.run().expect_err("Topic ghost has no document.");

	match err {
		Error::Round { epoch, function, source } => {
			assert_eq!((epoch, function), (1, 1));
			assert!(
				matches!(source.as_ref(), Error::MissingDocument { topic } if topic == "ghost"),
				"Unexpected error: {source}"
			);
		},
		other => panic!("Unexpected error: {other}"),
	}
}
