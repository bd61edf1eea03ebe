//! Imitation-learned clustering: search, classifier, threshold tuning and the training loop.

pub mod classifier;
pub mod imitation;
pub mod search;
pub mod transition;
pub mod tuning;

mod error;

pub use classifier::{Classifier, StructuredPerceptron};
pub use error::{Error, Result};
pub use imitation::Dagger;
pub use search::{Phase, SearchEngine, SearchOutcome, SearchSettings};
pub use transition::{PairwiseMergeTransition, Successor, Transition};
pub use tuning::StoppingRateTuner;

use cdcr_config::{ClassifierKind, Config};
use cdcr_domain::CorefScorer;
use cdcr_storage::{ExampleCorpus, FsDocumentStore, Layout};

pub type ReferenceEngine = SearchEngine<PairwiseMergeTransition, CorefScorer>;

pub type ReferenceDagger =
	Dagger<PairwiseMergeTransition, CorefScorer, StructuredPerceptron, FsDocumentStore>;

/// Search engine built from the configured search kind, loss and feature layout.
pub fn reference_engine(cfg: &Config) -> ReferenceEngine {
	let transition = PairwiseMergeTransition::new(cfg.features.item_dim as usize);
	let settings = SearchSettings::from_config(&cfg.search, cfg.method.best_state);
	let examples = ExampleCorpus::new(Layout::new(&cfg.experiment.result_dir));

	SearchEngine::new(transition, CorefScorer::new(cfg.search.loss), settings, examples)
}

/// Full training loop over the filesystem stores named in the config.
pub fn reference_dagger(cfg: Config) -> Result<ReferenceDagger> {
	let engine = reference_engine(&cfg);
	let feature_len = engine.transition().feature_len();
	let classifier = match cfg.classifier.kind {
		ClassifierKind::StructuredPerceptron =>
			StructuredPerceptron::from_config(feature_len, &cfg.classifier),
	};
	let documents = FsDocumentStore::new(&cfg.experiment.document_dir);

	Dagger::new(cfg, engine, classifier, documents)
}
