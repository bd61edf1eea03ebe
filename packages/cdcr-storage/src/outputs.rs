use serde::Serialize;

use cdcr_domain::{Document, Partition};

use crate::{Layout, Result};

#[derive(Serialize)]
struct PhaseLine<'a> {
	topic: &'a str,
	gold: &'a Partition,
	predicted: &'a Partition,
}

/// Per-phase record of what the search predicted for each topic.
#[derive(Debug, Clone)]
pub struct PhaseOutput {
	layout: Layout,
}
impl PhaseOutput {
	pub fn new(layout: Layout) -> Self {
		Self { layout }
	}

	pub fn record(&self, split: &str, epoch: u32, function: u32, document: &Document) -> Result<()> {
		let line = PhaseLine {
			topic: document.topic(),
			gold: document.gold(),
			predicted: document.predicted(),
		};

		crate::append_json_line(&self.layout.phase_output(split, epoch, function), &line)
	}
}
