//! Beam search over merge sequences.
//!
//! Training mode follows the oracle (the configured scorer against gold) and corrects the live
//! parameter whenever the model prefers a worse move. Testing mode follows the model alone
//! and stops once no move improves the score by at least the stopping threshold.

use cdcr_config::{BestStateCriterion, Search};
use cdcr_domain::{
	Beam, Document, Parameter, Partition, Scorer, SearchState,
	parameter::{difference, dot},
};
use cdcr_storage::{ExampleCorpus, ExampleRow, PHASE_STRIDE};

use crate::{
	Error, Result,
	transition::{Successor, Transition},
};

/// Identifies one search pass; example files of the pass are numbered from `tag()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
	pub epoch: u32,
	pub function: u32,
}
impl Phase {
	pub fn new(epoch: u32, function: u32) -> Self {
		Self { epoch, function }
	}

	pub fn tag(&self) -> u32 {
		self.function * PHASE_STRIDE
	}
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
	/// Best state of the trace under the pass's selection rule.
	pub best: SearchState,
	/// Partition to assign into the document.
	pub partition: Partition,
	/// Continuing steps taken.
	pub steps: usize,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
	pub width: usize,
	pub max_steps: u32,
	pub best_state: BestStateCriterion,
}
impl SearchSettings {
	pub fn from_config(search: &Search, best_state: BestStateCriterion) -> Self {
		Self { width: search.effective_width(), max_steps: search.max_steps, best_state }
	}
}

#[derive(Debug, Clone)]
struct Node {
	state: SearchState,
	loss: f64,
	candidate: usize,
}

struct Candidate {
	node: Node,
	features: Vec<f64>,
	model: f64,
}

pub struct SearchEngine<T, S> {
	transition: T,
	scorer: S,
	settings: SearchSettings,
	examples: ExampleCorpus,
}
impl<T, S> SearchEngine<T, S>
where
	T: Transition,
	S: Scorer,
{
	pub fn new(transition: T, scorer: S, settings: SearchSettings, examples: ExampleCorpus) -> Self {
		Self { transition, scorer, settings, examples }
	}

	pub fn transition(&self) -> &T {
		&self.transition
	}

	pub fn scorer(&self) -> &S {
		&self.scorer
	}

	pub fn examples(&self) -> &ExampleCorpus {
		&self.examples
	}

	/// Oracle-guided search that writes one example file per continuing step and updates
	/// `parameter` whenever the model's favourite is strictly worse than the loss-optimal move.
	pub fn training_by_search(
		&self,
		document: &Document,
		parameter: &mut Parameter,
		phase: Phase,
	) -> Result<SearchOutcome> {
		let topic = document.topic();
		let initial = SearchState::initial(document.initial_partition(), 0.0);
		let initial_loss = self.loss(initial.partition(), document);
		let mut best = Node { state: initial.clone(), loss: initial_loss, candidate: 0 };
		let mut beam = Beam::new(self.settings.width);
		let mut files = Vec::new();

		beam.insert(Node { state: initial, loss: initial_loss, candidate: 0 }, 0.0);

		for step in 0..self.settings.max_steps {
			let frontier = beam.drain();
			let frontier_loss =
				frontier.iter().map(|(node, _)| node.loss).fold(f64::NEG_INFINITY, f64::max);
			let candidates = self.expand(&frontier, document, parameter.weight(), true);

			if candidates.is_empty() {
				warn_if_stuck(&frontier, topic, phase);

				break;
			}

			let optimal = argmax(&candidates, |candidate| candidate.node.loss);
			let favourite = argmax(&candidates, |candidate| candidate.model);
			let optimal_loss = candidates[optimal].node.loss;

			if optimal_loss <= frontier_loss {
				break;
			}

			// A favourite as good as the first optimum is agreement and becomes the labelled move.
			let target =
				if candidates[favourite].node.loss >= optimal_loss { favourite } else { optimal };
			let file_index = phase.tag() + step;

			self.examples.write_step(
				topic,
				phase.epoch,
				file_index,
				&rows(&candidates, target, true),
			)?;
			files.push(file_index);

			if target != favourite {
				let delta =
					difference(&candidates[target].features, &candidates[favourite].features)?;

				parameter.update(&delta)?;

				tracing::debug!(
					topic,
					step,
					violations = parameter.violations(),
					"Model disagreed with the oracle."
				);
			}

			let chosen = candidates[target].node.clone();

			if chosen.loss > best.loss {
				best = chosen.clone();
			}

			for candidate in candidates {
				let priority = candidate.node.state.score();

				beam.insert(candidate.node, priority);
			}

			if !beam.iter().any(|(node, _)| node.candidate == target) {
				let priority = chosen.state.score();

				beam = Beam::new(self.settings.width);
				beam.insert(chosen, priority);
			}
		}

		self.examples.write_manifest(topic, phase.epoch, phase.tag(), &files)?;

		tracing::info!(
			topic,
			epoch = phase.epoch,
			function = phase.function,
			steps = files.len(),
			loss = best.loss,
			"Training search finished."
		);

		Ok(SearchOutcome {
			partition: best.state.partition().clone(),
			best: best.state,
			steps: files.len(),
		})
	}

	/// Model-guided search; with `emit_features` each continuing step is written as an example
	/// file labelled by the model's own choice. Gold is consulted only for the true-loss criterion.
	pub fn testing_by_search(
		&self,
		document: &Document,
		weight: &[f64],
		phase: Phase,
		emit_features: bool,
		stopping_threshold: f64,
	) -> Result<SearchOutcome> {
		let topic = document.topic();
		let initial = SearchState::initial(document.initial_partition(), 0.0);
		let track_loss = self.settings.best_state == BestStateCriterion::TrueLoss;
		let initial_loss =
			if track_loss { self.loss(initial.partition(), document) } else { 0.0 };
		let mut best = Node { state: initial.clone(), loss: initial_loss, candidate: 0 };
		let mut beam = Beam::new(self.settings.width);
		let mut files = Vec::new();
		let mut steps = 0;

		beam.insert(Node { state: initial, loss: initial_loss, candidate: 0 }, 0.0);

		for step in 0..self.settings.max_steps {
			let frontier = beam.drain();
			let candidates = self.expand(&frontier, document, weight, track_loss);

			if candidates.is_empty() {
				warn_if_stuck(&frontier, topic, phase);

				break;
			}

			let favourite = argmax(&candidates, |candidate| candidate.model);

			if candidates[favourite].model < stopping_threshold {
				tracing::debug!(
					topic,
					step,
					improvement = candidates[favourite].model,
					threshold = stopping_threshold,
					"Stopping threshold reached."
				);

				break;
			}

			if emit_features {
				let file_index = phase.tag() + step;

				self.examples.write_step(
					topic,
					phase.epoch,
					file_index,
					&rows(&candidates, favourite, track_loss),
				)?;
				files.push(file_index);
			}

			steps += 1;

			for candidate in candidates {
				let priority = candidate.node.state.score();

				beam.insert(candidate.node, priority);
			}

			let (retained, _) = beam.to_list();

			for node in retained {
				if self.prefers(node, &best) {
					best = node.clone();
				}
			}
		}

		if emit_features {
			self.examples.write_manifest(topic, phase.epoch, phase.tag(), &files)?;
		}

		tracing::debug!(
			topic,
			epoch = phase.epoch,
			function = phase.function,
			steps,
			score = best.state.score(),
			clusters = best.state.partition().len(),
			"Testing search finished."
		);

		Ok(SearchOutcome { partition: best.state.partition().clone(), best: best.state, steps })
	}

	fn loss(&self, partition: &Partition, document: &Document) -> f64 {
		self.scorer.score(partition, document.gold()).f1
	}

	fn prefers(&self, node: &Node, incumbent: &Node) -> bool {
		match self.settings.best_state {
			BestStateCriterion::ModelScore => node.state.score() > incumbent.state.score(),
			BestStateCriterion::TrueLoss => node.loss > incumbent.loss,
		}
	}

	/// Successors of every expandable frontier state, in frontier then generation order.
	fn expand(
		&self,
		frontier: &[(Node, f64)],
		document: &Document,
		weight: &[f64],
		with_loss: bool,
	) -> Vec<Candidate> {
		let mut candidates = Vec::new();

		for (node, _) in frontier {
			if node.state.partition().is_single_cluster() {
				continue;
			}

			for successor in self.transition.successors(node.state.partition(), document) {
				let Successor { action, partition, features } = match successor {
					Ok(successor) => successor,
					Err(err) => {
						tracing::warn!(
							topic = document.topic(),
							error = %err,
							"Dropping candidate with unusable features."
						);

						continue;
					},
				};
				let model = match dot(weight, &features) {
					Ok(model) => model,
					Err(err) => {
						tracing::warn!(
							topic = document.topic(),
							error = %err,
							"Dropping candidate the model cannot score."
						);

						continue;
					},
				};
				let loss = if with_loss { self.loss(&partition, document) } else { 0.0 };
				let state = node.state.successor(action, partition, node.state.score() + model);

				candidates.push(Candidate {
					node: Node { state, loss, candidate: candidates.len() },
					features,
					model,
				});
			}
		}

		candidates
	}
}

/// Every move out of an expandable frontier was dropped; the search keeps its best state so far.
fn warn_if_stuck(frontier: &[(Node, f64)], topic: &str, phase: Phase) {
	if frontier.iter().all(|(node, _)| node.state.partition().is_single_cluster()) {
		return;
	}

	let err = Error::EmptyBeam { topic: topic.to_string() };

	tracing::warn!(
		error = %err,
		epoch = phase.epoch,
		function = phase.function,
		"Search stopped early."
	);
}

/// Index of the first maximum.
fn argmax<F>(candidates: &[Candidate], key: F) -> usize
where
	F: Fn(&Candidate) -> f64,
{
	let mut best = 0;

	for (index, candidate) in candidates.iter().enumerate().skip(1) {
		if key(candidate) > key(&candidates[best]) {
			best = index;
		}
	}

	best
}

fn rows(candidates: &[Candidate], preferred: usize, with_loss: bool) -> Vec<ExampleRow> {
	candidates
		.iter()
		.enumerate()
		.map(|(index, candidate)| ExampleRow {
			label: u8::from(index == preferred),
			loss: with_loss.then_some(candidate.node.loss),
			score: candidate.model,
			features: candidate.features.clone(),
		})
		.collect()
}
