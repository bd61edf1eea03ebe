use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;

use cdcr_domain::{ItemId, Parameter, Score, Scorer};
use cdcr_service::{Phase, Transition};
use cdcr_storage::{
	CheckpointStore, DocumentStore, FsCheckpointStore, FsDocumentStore, ResultRow, ResultTables,
	RoundRecord,
};

#[derive(Debug, Parser)]
#[command(
	version = cdcr_cli::VERSION,
	rename_all = "kebab",
	styles = cdcr_cli::styles(),
)]
pub struct Args {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run every imitation learning round and print a summary of the result tables.
	Train {
		#[arg(long, short = 'c', value_name = "FILE")]
		config: PathBuf,
	},
	/// Search a single topic, guided by the gold partition or by a saved model.
	Search(SearchArgs),
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 't', value_name = "TOPIC")]
	pub topic: String,
	/// Checkpoint index to load; without it the search follows the gold partition.
	#[arg(long, value_name = "N")]
	pub model: Option<u32>,
	/// Write example files for every continuing step of a model-guided search.
	#[arg(long, requires = "model")]
	pub emit_features: bool,
	/// Minimum score improvement a model-guided step needs to continue.
	#[arg(long, value_name = "X", default_value_t = 0.0)]
	pub threshold: f64,
	#[arg(long, value_name = "N", default_value_t = 1)]
	pub epoch: u32,
	#[arg(
		long,
		value_name = "N",
		default_value_t = 1,
		value_parser = clap::value_parser!(u32).range(1..=i64::from(cdcr_config::MAX_FUNCTIONS)),
	)]
	pub function: u32,
}

#[derive(Debug, Serialize)]
struct TrainSummary {
	rounds: Vec<RoundRecord>,
	training: Vec<ResultRow>,
	testing: Vec<ResultRow>,
	final_violations: u64,
}

#[derive(Debug, Serialize)]
struct SearchSummary {
	topic: String,
	mode: &'static str,
	steps: usize,
	model_score: f64,
	clusters: Vec<Vec<ItemId>>,
	score: Score,
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	match args.command {
		Command::Train { config } => train(config),
		Command::Search(args) => search(args),
	}
}

fn train(path: PathBuf) -> color_eyre::Result<()> {
	let cfg = cdcr_config::load(&path)?;

	cdcr_cli::init_logging(&cfg.experiment.log_level);

	tracing::info!(
		config = %path.display(),
		epochs = cfg.method.epochs,
		functions = cfg.method.functions,
		"Training started."
	);

	let mut dagger = cdcr_service::reference_dagger(cfg)?;
	let models = dagger.run()?;
	let tables = dagger.tables();
	let summary = TrainSummary {
		rounds: tables.read(ResultTables::ROUNDS)?,
		training: tables.read(ResultTables::TRAINING)?,
		testing: tables.read(ResultTables::TESTING)?,
		final_violations: models.last().map(Parameter::violations).unwrap_or_default(),
	};

	cdcr_cli::print_json(&summary)?;

	Ok(())
}

fn search(args: SearchArgs) -> color_eyre::Result<()> {
	let cfg = cdcr_config::load(&args.config)?;

	cdcr_cli::init_logging(&cfg.experiment.log_level);

	let engine = cdcr_service::reference_engine(&cfg);
	let document = FsDocumentStore::new(&cfg.experiment.document_dir).load(&args.topic)?;
	let phase = Phase::new(args.epoch, args.function);
	let (mode, outcome) = match args.model {
		Some(index) => {
			let checkpoints = FsCheckpointStore::new(&cfg.experiment.result_dir);
			let parameter: Parameter = checkpoints.load(&format!("model/{index}"))?;
			let weight = parameter.weight_for_testing(cfg.method.average_weight);

			if weight.len() != engine.transition().feature_len() {
				return Err(eyre::eyre!(
					"Model {index} has {} weights but the features have {} dimensions.",
					weight.len(),
					engine.transition().feature_len()
				));
			}

			let outcome = engine.testing_by_search(
				&document,
				&weight,
				phase,
				args.emit_features,
				args.threshold,
			)?;

			("model", outcome)
		},
		None => {
			let mut parameter = Parameter::new(engine.transition().feature_len());
			let outcome = engine.training_by_search(&document, &mut parameter, phase)?;

			("oracle", outcome)
		},
	};
	let summary = SearchSummary {
		topic: args.topic,
		mode,
		steps: outcome.steps,
		model_score: outcome.best.score(),
		clusters: outcome.partition.groups(),
		score: engine.scorer().score(&outcome.partition, document.gold()),
	};

	cdcr_cli::print_json(&summary)?;

	Ok(())
}
