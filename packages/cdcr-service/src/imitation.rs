//! DAgger-style outer loop: epochs of `functions` rounds, each retraining on every example
//! file generated so far.

use cdcr_config::{Config, StoppingMode};
use cdcr_domain::{Corpus, Document, Parameter, Score, Scorer};
use cdcr_storage::{
	CheckpointStore, DocumentStore, FsCheckpointStore, Layout, PhaseOutput, ResultRow,
	ResultTables, RoundRecord, TopicExamples, model_key,
};

use crate::{
	Result,
	classifier::Classifier,
	search::{Phase, SearchEngine},
	transition::Transition,
	tuning::StoppingRateTuner,
};

const SPLIT_TRAINING: &str = "training";
const SPLIT_VALIDATION: &str = "validation";
const SPLIT_TESTING: &str = "testing";

pub struct Dagger<T, S, C, D> {
	config: Config,
	engine: SearchEngine<T, S>,
	classifier: C,
	documents: D,
	checkpoints: FsCheckpointStore,
	tables: ResultTables,
	outputs: PhaseOutput,
	tuner: Option<StoppingRateTuner>,
}
impl<T, S, C, D> Dagger<T, S, C, D>
where
	T: Transition,
	S: Scorer,
	C: Classifier,
	D: DocumentStore,
{
	pub fn new(
		config: Config,
		engine: SearchEngine<T, S>,
		classifier: C,
		documents: D,
	) -> Result<Self> {
		let layout = Layout::new(&config.experiment.result_dir);
		let tuner = match config.stopping.mode {
			StoppingMode::Tuning => Some(StoppingRateTuner::new(
				config.stopping.start,
				config.stopping.end,
				config.stopping.steps,
			)?),
			StoppingMode::None => None,
		};

		Ok(Self {
			checkpoints: FsCheckpointStore::new(layout.root()),
			tables: ResultTables::new(layout.clone()),
			outputs: PhaseOutput::new(layout),
			config,
			engine,
			classifier,
			documents,
			tuner,
		})
	}

	pub fn engine(&self) -> &SearchEngine<T, S> {
		&self.engine
	}

	pub fn tables(&self) -> &ResultTables {
		&self.tables
	}

	/// Runs every round starting from an all-zero model.
	pub fn run(&mut self) -> Result<Vec<Parameter>> {
		self.run_from(Parameter::new(self.engine.transition().feature_len()))
	}

	/// Runs every round and returns the model of each, in round order.
	pub fn run_from(&mut self, initial: Parameter) -> Result<Vec<Parameter>> {
		let epochs = self.config.method.epochs;
		let functions = self.config.method.functions;
		let mut produced = Vec::with_capacity((epochs * functions) as usize);
		let mut current = initial;

		for epoch in 1..=epochs {
			for function in 1..=functions {
				current = self
					.round(Phase::new(epoch, function), current)
					.map_err(|err| err.in_round(epoch, function))?;

				produced.push(current.clone());
			}
		}

		tracing::info!(rounds = produced.len(), "Imitation learning finished.");

		Ok(produced)
	}

	fn round(&mut self, phase: Phase, previous: Parameter) -> Result<Parameter> {
		let Phase { epoch, function } = phase;
		let functions = self.config.method.functions;
		let averaged = self.config.method.average_weight;

		tracing::debug!(
			epoch,
			function,
			violations = previous.violations(),
			weight = ?previous.weight(),
			total = ?previous.total_weight(),
			average = ?previous.average(),
			"Round started."
		);

		let score = if function == 1 {
			self.train_by_search(phase, previous)?
		} else {
			let weight = previous.weight_for_testing(averaged);

			self.evaluate(
				&self.config.experiment.training_topics,
				SPLIT_TRAINING,
				&weight,
				phase,
				true,
				0.0,
			)?
		};

		self.tables.append(
			ResultTables::TRAINING,
			&ResultRow::new(SPLIT_TRAINING, epoch, function, &score),
		)?;

		let aggregated = self.engine.examples().aggregate(
			&self.config.experiment.training_topics,
			epoch,
			function,
		)?;
		let aggregated_files: usize = aggregated.iter().map(TopicExamples::file_count).sum();

		tracing::info!(epoch, function, files = aggregated_files, "Example files aggregated.");

		let trained = self.classifier.train(&aggregated, function)?;
		let weight = trained.weight_for_testing(averaged);
		let threshold = self.stopping_threshold(&weight, phase)?;

		if self.config.method.validate_on_training && function == functions {
			let validation = Phase::new(epoch, functions + 1);
			let score = self.evaluate(
				&self.config.experiment.training_topics,
				SPLIT_VALIDATION,
				&weight,
				validation,
				false,
				threshold,
			)?;

			self.tables.append(
				ResultTables::TRAINING,
				&ResultRow::new(SPLIT_VALIDATION, epoch, validation.function, &score),
			)?;
		}

		let score = self.evaluate(
			&self.config.experiment.testing_topics,
			SPLIT_TESTING,
			&weight,
			phase,
			false,
			threshold,
		)?;

		self.tables.append(
			ResultTables::TESTING,
			&ResultRow::new(SPLIT_TESTING, epoch, function, &score),
		)?;

		tracing::info!(
			epoch,
			function,
			threshold,
			composite = score.composite,
			f1 = score.f1,
			"Round evaluated."
		);

		self.checkpoints.save(&model_key(epoch, function, functions), &trained)?;
		self.tables.append(
			ResultTables::ROUNDS,
			&RoundRecord::new(epoch, function, aggregated_files, threshold, trained.violations()),
		)?;

		Ok(trained)
	}

	/// Oracle pass over the training split; the live parameter absorbs every correction.
	fn train_by_search(&self, phase: Phase, mut live: Parameter) -> Result<Score> {
		let mut corpus = Corpus::new();

		for topic in &self.config.experiment.training_topics {
			let mut document = self.documents.load(topic)?;
			let outcome = self.engine.training_by_search(&document, &mut live, phase)?;

			document.set_predicted(outcome.partition);
			self.outputs.record(SPLIT_TRAINING, phase.epoch, phase.function, &document)?;
			corpus.merge(&document);
		}

		tracing::debug!(
			epoch = phase.epoch,
			violations = live.violations(),
			"Oracle pass finished."
		);

		Ok(self.engine.scorer().score(corpus.predicted(), corpus.gold()))
	}

	fn stopping_threshold(&self, weight: &[f64], phase: Phase) -> Result<f64> {
		let Some(tuner) = &self.tuner else {
			return Ok(0.0);
		};
		let mut documents = self.load_all(&self.config.experiment.development_topics)?;

		tuner.tune(&self.engine, &mut documents, weight, phase, &self.tables)
	}

	fn evaluate(
		&self,
		topics: &[String],
		split: &str,
		weight: &[f64],
		phase: Phase,
		emit_features: bool,
		threshold: f64,
	) -> Result<Score> {
		let mut corpus = Corpus::new();

		for mut document in self.load_all(topics)? {
			let outcome =
				self.engine.testing_by_search(&document, weight, phase, emit_features, threshold)?;

			document.set_predicted(outcome.partition);
			self.outputs.record(split, phase.epoch, phase.function, &document)?;
			corpus.merge(&document);
		}

		Ok(self.engine.scorer().score(corpus.predicted(), corpus.gold()))
	}

	fn load_all(&self, topics: &[String]) -> Result<Vec<Document>> {
		topics.iter().map(|topic| self.documents.load(topic).map_err(Into::into)).collect()
	}
}
