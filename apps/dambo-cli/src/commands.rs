use std::{fs, path::Path};

use color_eyre::Result;

use dambo_config::Config;
use dambo_ingest::{
	artifacts, benefits, conditions, convert, coverage, embed, link as linker, pipeline, plan,
	risk_events,
	source::PdfPageSource,
};
use dambo_providers::embedding::Embedder;
use dambo_retrieval::{catalogs::Catalogs, context, retriever::Retriever};
use dambo_storage::{db::Db, entities};

async fn connect(cfg: &Config) -> Result<Db> {
	let db = Db::connect(&cfg.storage).await?;

	db.ensure_schema(cfg.storage.vector_dim).await?;

	Ok(db)
}

pub async fn convert(cfg: &Config, metadata: &Path, pdf_root: &Path) -> Result<()> {
	let records = artifacts::load_ingest_records(metadata)?;
	let out_root = Path::new(&cfg.ingest.converted_root);
	let mut converted = 0_usize;
	let mut failed = 0_usize;

	for record in &records {
		match convert_one(record, pdf_root, out_root) {
			Ok(report) => {
				converted += 1;

				println!(
					"{}: {} pages, {} tables, {} sections",
					record.document_id, report.total_pages, report.tables, report.sections
				);
			},
			Err(err) => {
				failed += 1;

				tracing::error!(document_id = %record.document_id, %err, "conversion failed");
			},
		}
	}

	println!("converted {converted}/{} documents ({failed} failed)", records.len());

	Ok(())
}

fn convert_one(
	record: &artifacts::IngestRecord,
	pdf_root: &Path,
	out_root: &Path,
) -> Result<convert::ConvertReport> {
	let pdf_path = pdf_root.join(&record.file_path);
	let file_size_bytes = fs::metadata(&pdf_path)?.len();
	let source = PdfPageSource::open(&pdf_path)?;
	let request = convert::ConvertRequest {
		document_id: record.document_id.clone(),
		company_name: record.company_name.clone(),
		product_name: record.product_name.clone(),
		doc_type: record.doc_type.clone(),
		version: record.version.clone(),
		effective_date: record.effective_date.clone(),
		source_file: record.file_path.clone(),
		file_size_bytes,
	};

	Ok(convert::convert_document(&source, &request, out_root)?)
}

pub async fn ingest(cfg: &Config, metadata: &Path) -> Result<()> {
	let records = artifacts::load_ingest_records(metadata)?;
	let db = connect(cfg).await?;
	let report = pipeline::run_ingest(&db.pool, cfg, &records).await?;

	println!(
		"processed {} documents ({} clauses), skipped {}, failed {}",
		report.processed, report.clauses, report.skipped, report.failed
	);

	Ok(())
}

pub async fn extract_coverages(cfg: &Config) -> Result<()> {
	let db = connect(cfg).await?;
	let report = coverage::extract_coverages(&db.pool).await?;

	println!(
		"scanned {} rows, upserted {} coverages, {} invalid names",
		report.scanned, report.upserted, report.invalid
	);

	Ok(())
}

pub async fn link(cfg: &Config) -> Result<()> {
	let db = connect(cfg).await?;
	let report = linker::link_all(&db.pool, &cfg.linker, &cfg.llm).await?;

	println!("linked: exact {}, fuzzy {}, llm {}", report.exact, report.fuzzy, report.llm);

	for stat in linker::stats(&db.pool).await? {
		println!(
			"  {}: {} pairs over {} clauses",
			stat.extraction_method, stat.mapped_pairs, stat.distinct_clauses
		);
	}

	Ok(())
}

pub async fn extract_entities(cfg: &Config) -> Result<()> {
	let db = connect(cfg).await?;
	let benefit = benefits::extract_benefits(&db.pool).await?;
	let risk = risk_events::extract_risk_events(&db.pool).await?;
	let condition = conditions::extract_conditions(&db.pool).await?;
	let plans = plan::extract_plans(&db.pool).await?;

	println!("benefits: {} inserted from {} rows", benefit.inserted, benefit.scanned);
	println!("risk events: {} inserted from {} definitions", risk.inserted, risk.scanned);
	println!(
		"conditions: {} conditions, {} exclusions from {} clauses",
		condition.conditions, condition.exclusions, condition.scanned
	);
	println!("plans: {} plans over {} linked rows", plans.plans, plans.linked_rows);

	Ok(())
}

pub async fn build_index(cfg: &Config) -> Result<()> {
	let db = connect(cfg).await?;
	let embedder = Embedder::new(&cfg.embedding)?;
	let report =
		embed::build_embeddings(&db.pool, &embedder, cfg.ingest.embedding_batch_size).await?;

	println!("embedded {} clauses, skipped {}", report.embedded, report.skipped);

	Ok(())
}

pub async fn search(cfg: &Config, query: &str) -> Result<()> {
	let db = connect(cfg).await?;
	let catalogs = Catalogs::load(&db.pool).await?;
	let retriever = Retriever::new(db.pool.clone(), Embedder::new(&cfg.embedding)?, &cfg.retrieval);

	for (rank, scored) in retriever.search(query, &catalogs).await?.iter().enumerate() {
		let hit = &scored.hit;
		let title = hit
			.clause_title
			.as_deref()
			.or(hit.clause_number.as_deref())
			.unwrap_or(&hit.clause_type);

		println!(
			"{:>2}. {:.4} (+{:.2}) [{} / {}] {} | {}",
			rank + 1,
			scored.score,
			scored.boost,
			hit.company_name,
			hit.doc_type,
			title,
			snippet(&hit.clause_text),
		);
	}

	Ok(())
}

pub async fn hybrid(cfg: &Config, query: &str) -> Result<()> {
	let db = connect(cfg).await?;
	let catalogs = Catalogs::load(&db.pool).await?;
	let retriever = Retriever::new(db.pool.clone(), Embedder::new(&cfg.embedding)?, &cfg.retrieval);
	let hits = retriever.search(query, &catalogs).await?;
	let assembled =
		context::assemble(&db.pool, query, hits, cfg.retrieval.max_context_length as usize).await?;

	println!("{}", serde_json::to_string_pretty(&assembled)?);

	Ok(())
}

pub async fn compare(cfg: &Config, query: &str) -> Result<()> {
	let db = connect(cfg).await?;
	let catalogs = Catalogs::load(&db.pool).await?;
	let retriever = Retriever::new(db.pool.clone(), Embedder::new(&cfg.embedding)?, &cfg.retrieval);

	for (company, hits) in retriever.search_multi_company(query, &catalogs).await? {
		println!("{company} ({} hits)", hits.len());

		for scored in hits {
			println!(
				"  {:.4} [{}] {}",
				scored.score,
				scored.hit.doc_type,
				snippet(&scored.hit.clause_text)
			);
		}
	}

	Ok(())
}

pub async fn plan_report(cfg: &Config) -> Result<()> {
	let db = connect(cfg).await?;

	for plan in entities::list_plans(&db.pool).await? {
		println!(
			"plan {} | {} {} | gender {} age {} | period {} | premium {} | {} coverages",
			plan.plan_id,
			plan.company_name,
			plan.product_name,
			plan.target_gender.as_deref().unwrap_or("-"),
			plan.target_age.map(|age| age.to_string()).unwrap_or_else(|| "-".to_string()),
			plan.insurance_period.as_deref().unwrap_or("-"),
			plan.total_premium.map(|sum| sum.to_string()).unwrap_or_else(|| "-".to_string()),
			plan.coverage_count,
		);
	}

	Ok(())
}

fn snippet(text: &str) -> String {
	let flattened = text.replace('\n', " ");
	let truncated: String = flattened.chars().take(80).collect();

	if truncated.chars().count() < flattened.chars().count() {
		return format!("{truncated}…");
	}

	truncated
}
