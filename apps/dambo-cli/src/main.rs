use clap::Parser;

use dambo_cli::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	dambo_cli::run(args).await
}
