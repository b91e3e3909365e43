//! Writes one parsed document into the store. Everything for a document
//! happens in a single transaction so a failure leaves no partial rows.

use serde_json::Value;
use sqlx::PgPool;

use dambo_storage::{documents, models::NewClause, ontology};

use crate::{Result, artifacts::IngestRecord};

#[derive(Debug)]
pub struct PersistReport {
	pub document_pk: i64,
	pub product_id: i64,
	pub clauses: usize,
}

pub async fn persist_document(
	pool: &PgPool,
	record: &IngestRecord,
	total_pages: Option<i32>,
	clauses: &[NewClause],
) -> Result<PersistReport> {
	let mut tx = pool.begin().await?;
	let company_id = ontology::upsert_company(
		&mut *tx,
		&record.company_name,
		&record.company_code.to_lowercase(),
		None,
	)
	.await?;
	let product_id = ontology::upsert_product(
		&mut *tx,
		company_id,
		&record.product_code,
		&record.product_name,
		None,
		&record.version,
		record.effective_date.as_deref(),
	)
	.await?;
	let variant_id = match variant_code(record) {
		Some(code) => Some(
			ontology::upsert_variant(
				&mut *tx,
				product_id,
				&code,
				record.target_gender(),
				record.target_age_range(),
			)
			.await?,
		),
		None => None,
	};
	let attributes = record.attributes.clone().unwrap_or(Value::Null);
	let document_pk = documents::upsert_document(
		&mut *tx,
		&record.document_id,
		product_id,
		variant_id,
		&record.doc_type,
		record.doc_subtype.as_deref(),
		Some(&record.file_path),
		total_pages,
		&attributes,
	)
	.await?;

	for clause in clauses {
		documents::insert_clause(&mut *tx, document_pk, clause).await?;
	}

	tx.commit().await?;

	Ok(PersistReport { document_pk, product_id, clauses: clauses.len() })
}

/// Variant identity is the gender/age pair from the document attributes;
/// documents without either belong to the product directly.
fn variant_code(record: &IngestRecord) -> Option<String> {
	let gender = record.target_gender();
	let age_range = record.target_age_range();

	if gender.is_none() && age_range.is_none() {
		return None;
	}

	Some(format!(
		"{}_{}",
		gender.unwrap_or("any"),
		age_range.unwrap_or("any")
	))
}
