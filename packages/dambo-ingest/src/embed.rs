//! Embedding builder: fetches clauses without vectors, embeds them in
//! batches, and commits each batch on its own. A failed batch is logged
//! and skipped; the rest of the run continues.

use serde_json::{Value, json};
use sqlx::PgPool;

use dambo_providers::embedding::Embedder;
use dambo_storage::{
	documents::{self, PendingClause},
	embeddings,
};

use crate::Result;

/// Upper bound on clauses fetched per run; batching happens client-side.
const FETCH_LIMIT: i64 = 1_000_000;

#[derive(Debug, Default)]
pub struct EmbedReport {
	pub embedded: u64,
	pub skipped: u64,
}

pub async fn build_embeddings(
	pool: &PgPool,
	embedder: &Embedder,
	batch_size: u32,
) -> Result<EmbedReport> {
	let pending = documents::list_clauses_without_embedding(pool, FETCH_LIMIT).await?;
	let mut report = EmbedReport::default();

	for batch in pending.chunks(batch_size.max(1) as usize) {
		let texts: Vec<String> = batch.iter().map(|clause| clause.clause_text.clone()).collect();
		let vectors = match embedder.embed_documents(&texts).await {
			Ok(vectors) => vectors,
			Err(err) => {
				tracing::warn!(batch = batch.len(), %err, "embedding batch failed; skipping");

				report.skipped += batch.len() as u64;

				continue;
			},
		};

		let mut tx = pool.begin().await?;

		for (clause, vector) in batch.iter().zip(&vectors) {
			embeddings::validate_vector_dim(vector, embedder.dim())?;
			embeddings::insert_clause_embedding(
				&mut *tx,
				clause.clause_id,
				vector,
				embedder.model_name(),
				&clause_metadata(clause),
			)
			.await?;
		}

		tx.commit().await?;

		report.embedded += batch.len() as u64;
	}

	tracing::info!(embedded = report.embedded, skipped = report.skipped, "embedding build finished");

	Ok(report)
}

/// Metadata stored beside the vector, used by retrieval filters without
/// joining back through the clause.
fn clause_metadata(clause: &PendingClause) -> Value {
	let mut metadata = json!({
		"clause_type": clause.clause_type,
		"doc_type": clause.doc_type,
		"product_id": clause.product_id,
		"coverage_ids": clause.coverage_ids,
	});

	if let Some(structured) = &clause.structured_data {
		metadata["structured_data"] = structured.clone();
	}

	metadata
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn metadata_carries_filterable_fields() {
		let clause = PendingClause {
			clause_id: 10,
			clause_type: "table_row".to_string(),
			clause_text: "암진단비, 가입금액: 3,000만원".to_string(),
			doc_type: "proposal".to_string(),
			product_id: 3,
			structured_data: Some(json!({ "coverage_name": "암진단비" })),
			coverage_ids: vec![5, 9],
		};
		let metadata = clause_metadata(&clause);

		assert_eq!(metadata["clause_type"], "table_row");
		assert_eq!(metadata["doc_type"], "proposal");
		assert_eq!(metadata["coverage_ids"], json!([5, 9]));
		assert_eq!(metadata["structured_data"]["coverage_name"], "암진단비");
	}

	#[test]
	fn metadata_omits_structured_data_when_absent() {
		let clause = PendingClause {
			clause_id: 11,
			clause_type: "article".to_string(),
			clause_text: "제1조".to_string(),
			doc_type: "terms".to_string(),
			product_id: 3,
			structured_data: None,
			coverage_ids: Vec::new(),
		};

		assert!(clause_metadata(&clause).get("structured_data").is_none());
	}
}
