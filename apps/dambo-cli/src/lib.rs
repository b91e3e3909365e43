use std::path::PathBuf;

use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use tracing_subscriber::EnvFilter;

pub mod commands;

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", styles = styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE", default_value = "dambo.toml")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Convert source PDFs into the on-disk artifact tree.
	Convert {
		#[arg(long, short = 'm', value_name = "FILE")]
		metadata: PathBuf,
		#[arg(long, value_name = "DIR")]
		pdf_root: PathBuf,
	},
	/// Parse converted documents and persist their clauses.
	Ingest {
		#[arg(long, short = 'm', value_name = "FILE")]
		metadata: PathBuf,
	},
	/// Build the coverage ontology from persisted table rows.
	ExtractCoverages,
	/// Run the clause-to-coverage linker tiers.
	Link,
	/// Extract benefits, risk events, conditions, exclusions and plans.
	ExtractEntities,
	/// Embed clauses that have no vector yet.
	BuildIndex,
	/// Vector search with entity filters, printed as a ranked list.
	Search {
		query: String,
		#[arg(long, value_name = "N")]
		top_k: Option<u32>,
	},
	/// Full retrieval: search plus assembled context, printed as JSON.
	Hybrid {
		query: String,
	},
	/// Per-company candidate lists for comparison queries.
	Compare {
		query: String,
	},
	/// Summarize extracted plans.
	PlanReport,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let mut cfg = dambo_config::load(&args.config)?;
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	match args.command {
		Command::Convert { metadata, pdf_root } =>
			commands::convert(&cfg, &metadata, &pdf_root).await,
		Command::Ingest { metadata } => commands::ingest(&cfg, &metadata).await,
		Command::ExtractCoverages => commands::extract_coverages(&cfg).await,
		Command::Link => commands::link(&cfg).await,
		Command::ExtractEntities => commands::extract_entities(&cfg).await,
		Command::BuildIndex => commands::build_index(&cfg).await,
		Command::Search { query, top_k } => {
			if let Some(top_k) = top_k {
				cfg.retrieval.top_k = top_k;
			}

			commands::search(&cfg, &query).await
		},
		Command::Hybrid { query } => commands::hybrid(&cfg, &query).await,
		Command::Compare { query } => commands::compare(&cfg, &query).await,
		Command::PlanReport => commands::plan_report(&cfg).await,
	}
}
