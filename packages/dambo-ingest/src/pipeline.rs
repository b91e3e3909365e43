//! Batch driver: walks the ingestion metadata array one document at a
//! time. A document failure is logged and checkpointed; the run goes on.

use std::path::{Path, PathBuf};

use sqlx::PgPool;

use dambo_domain::coverage::Strictness;

use crate::{
	Result,
	artifacts::{ConvertedDocument, IngestRecord},
	checkpoint::Checkpoint,
	parsers, persist,
};

#[derive(Debug, Default)]
pub struct IngestReport {
	pub processed: usize,
	pub skipped: usize,
	pub failed: usize,
	pub clauses: usize,
}

pub async fn run_ingest(
	pool: &PgPool,
	cfg: &dambo_config::Config,
	records: &[IngestRecord],
) -> Result<IngestReport> {
	let converted_root = Path::new(&cfg.ingest.converted_root);
	let strictness = if cfg.ingest.strict_coverage_validation {
		Strictness::Strict
	} else {
		Strictness::Lenient
	};
	let mut checkpoint = Checkpoint::load_or_new(&checkpoint_path(cfg))?;
	let mut report = IngestReport::default();

	for record in records {
		if checkpoint.is_completed(&record.document_id) {
			report.skipped += 1;

			continue;
		}

		match ingest_one(pool, converted_root, record, strictness).await {
			Ok(clauses) => {
				checkpoint.record_completed(&record.document_id)?;

				report.processed += 1;
				report.clauses += clauses;
			},
			Err(err) => {
				tracing::error!(document_id = %record.document_id, %err, "document ingest failed");

				checkpoint.record_failed(&record.document_id)?;

				report.failed += 1;
			},
		}
	}

	tracing::info!(
		processed = report.processed,
		skipped = report.skipped,
		failed = report.failed,
		clauses = report.clauses,
		"ingest run finished"
	);

	Ok(report)
}

async fn ingest_one(
	pool: &PgPool,
	converted_root: &Path,
	record: &IngestRecord,
	strictness: Strictness,
) -> Result<usize> {
	let doc_dir = converted_root.join(&record.company_name).join(&record.document_id);
	let doc = ConvertedDocument::load(&doc_dir)?;
	let clauses = parsers::parse_document(&doc, record, strictness)?;
	let persisted = persist::persist_document(
		pool,
		record,
		Some(doc.metadata.total_pages as i32),
		&clauses,
	)
	.await?;

	tracing::info!(
		document_id = %record.document_id,
		clauses = persisted.clauses,
		"document ingested"
	);

	Ok(persisted.clauses)
}

fn checkpoint_path(cfg: &dambo_config::Config) -> PathBuf {
	match &cfg.ingest.checkpoint_path {
		Some(path) => PathBuf::from(path),
		None => Path::new(&cfg.ingest.converted_root).join(".ingest_checkpoint.json"),
	}
}
