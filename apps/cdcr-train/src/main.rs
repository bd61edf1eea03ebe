use clap::Parser;

use cdcr_train::Args;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cdcr_train::run(args)
}
