use serde_json::Value;
use sqlx::PgExecutor;

use crate::{Result, models::NewClause};

/// Postgres rejects NUL bytes inside text values; PDF extraction produces
/// them occasionally.
pub fn strip_nul(text: &str) -> String {
	text.replace('\u{0}', "")
}

/// Strips NUL bytes from every string leaf of a JSON value.
pub fn strip_json_nul(value: Value) -> Value {
	match value {
		Value::String(text) => Value::String(strip_nul(&text)),
		Value::Array(items) => Value::Array(items.into_iter().map(strip_json_nul).collect()),
		Value::Object(map) =>
			Value::Object(map.into_iter().map(|(key, item)| (key, strip_json_nul(item))).collect()),
		other => other,
	}
}

#[allow(clippy::too_many_arguments)]
pub async fn upsert_document<'e, E>(
	executor: E,
	document_id: &str,
	product_id: i64,
	variant_id: Option<i64>,
	doc_type: &str,
	doc_subtype: Option<&str>,
	file_path: Option<&str>,
	total_pages: Option<i32>,
	attributes: &Value,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO document (
	document_id,
	product_id,
	variant_id,
	doc_type,
	doc_subtype,
	file_path,
	total_pages,
	attributes
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (document_id) DO UPDATE
SET document_id = EXCLUDED.document_id
RETURNING id",
	)
	.bind(document_id)
	.bind(product_id)
	.bind(variant_id)
	.bind(doc_type)
	.bind(doc_subtype)
	.bind(file_path)
	.bind(total_pages)
	.bind(attributes)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

pub async fn insert_clause<'e, E>(executor: E, document_id: i64, clause: &NewClause) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let structured_data =
		clause.structured_data.clone().map(strip_json_nul);
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO document_clause (
	document_id,
	clause_type,
	clause_number,
	clause_title,
	clause_text,
	structured_data,
	section_type,
	page_number,
	hierarchy_level
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
RETURNING id",
	)
	.bind(document_id)
	.bind(clause.clause_type.as_str())
	.bind(clause.clause_number.as_deref())
	.bind(clause.clause_title.as_deref().map(strip_nul))
	.bind(strip_nul(&clause.clause_text))
	.bind(structured_data)
	.bind(clause.section_type.as_deref())
	.bind(clause.page_number)
	.bind(clause.hierarchy_level)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

/// Table-row clause carrying a structured coverage name, joined to its
/// product. Input to the coverage extractor and the exact-match linker.
#[derive(Debug, sqlx::FromRow)]
pub struct CoverageBearingRow {
	pub clause_id: i64,
	pub product_id: i64,
	pub doc_type: String,
	pub structured_data: Value,
}

pub async fn list_coverage_bearing_rows<'e, E>(executor: E) -> Result<Vec<CoverageBearingRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, CoverageBearingRow>(
		"\
SELECT
	dc.id AS clause_id,
	d.product_id,
	d.doc_type,
	dc.structured_data
FROM document_clause dc
JOIN document d ON dc.document_id = d.id
WHERE dc.clause_type = 'table_row'
	AND dc.structured_data ->> 'coverage_name' IS NOT NULL
	AND dc.structured_data ->> 'coverage_name' != ''
ORDER BY dc.id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Clause still missing any coverage mapping, joined to its product.
#[derive(Debug, sqlx::FromRow)]
pub struct UnmappedClause {
	pub clause_id: i64,
	pub product_id: i64,
	pub clause_title: Option<String>,
	pub clause_text: String,
}

pub async fn list_unmapped_clauses<'e, E>(
	executor: E,
	clause_types: &[&str],
) -> Result<Vec<UnmappedClause>>
where
	E: PgExecutor<'e>,
{
	let types: Vec<String> = clause_types.iter().map(|t| t.to_string()).collect();
	let rows = sqlx::query_as::<_, UnmappedClause>(
		"\
SELECT
	dc.id AS clause_id,
	d.product_id,
	dc.clause_title,
	dc.clause_text
FROM document_clause dc
JOIN document d ON dc.document_id = d.id
WHERE dc.clause_type = ANY($1)
	AND NOT EXISTS (SELECT 1 FROM clause_coverage cc WHERE cc.clause_id = dc.id)
ORDER BY dc.id ASC",
	)
	.bind(types)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Clause waiting for an embedding, with everything the metadata payload
/// needs in one round trip.
#[derive(Debug, sqlx::FromRow)]
pub struct PendingClause {
	pub clause_id: i64,
	pub clause_type: String,
	pub clause_text: String,
	pub doc_type: String,
	pub product_id: i64,
	pub structured_data: Option<Value>,
	pub coverage_ids: Vec<i64>,
}

pub async fn list_clauses_without_embedding<'e, E>(
	executor: E,
	limit: i64,
) -> Result<Vec<PendingClause>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PendingClause>(
		"\
SELECT
	dc.id AS clause_id,
	dc.clause_type,
	dc.clause_text,
	d.doc_type,
	d.product_id,
	dc.structured_data,
	COALESCE(
		ARRAY_AGG(cc.coverage_id) FILTER (WHERE cc.coverage_id IS NOT NULL),
		'{}'
	) AS coverage_ids
FROM document_clause dc
JOIN document d ON dc.document_id = d.id
LEFT JOIN clause_coverage cc ON cc.clause_id = dc.id
WHERE NOT EXISTS (SELECT 1 FROM clause_embedding ce WHERE ce.clause_id = dc.id)
GROUP BY dc.id, dc.clause_type, dc.clause_text, d.doc_type, d.product_id, dc.structured_data
ORDER BY dc.id ASC
LIMIT $1",
	)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Table-row clause already linked to a coverage. Input to the benefit
/// extractor.
#[derive(Debug, sqlx::FromRow)]
pub struct LinkedTableRow {
	pub clause_id: i64,
	pub coverage_id: i64,
	pub structured_data: Value,
}

pub async fn list_linked_table_rows<'e, E>(executor: E) -> Result<Vec<LinkedTableRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, LinkedTableRow>(
		"\
SELECT
	dc.id AS clause_id,
	cc.coverage_id,
	dc.structured_data
FROM document_clause dc
JOIN clause_coverage cc ON cc.clause_id = dc.id
WHERE dc.clause_type = 'table_row'
	AND dc.structured_data IS NOT NULL
ORDER BY dc.id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Terms clause linked to a coverage, for condition and exclusion mining.
#[derive(Debug, sqlx::FromRow)]
pub struct LinkedTermsClause {
	pub clause_id: i64,
	pub coverage_id: i64,
	pub clause_title: Option<String>,
	pub clause_text: String,
}

pub async fn list_linked_terms_clauses<'e, E>(executor: E) -> Result<Vec<LinkedTermsClause>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, LinkedTermsClause>(
		"\
SELECT
	dc.id AS clause_id,
	cc.coverage_id,
	dc.clause_title,
	dc.clause_text
FROM document_clause dc
JOIN clause_coverage cc ON cc.clause_id = dc.id
JOIN document d ON dc.document_id = d.id
WHERE d.doc_type = 'terms'
ORDER BY dc.id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Terms clause whose title marks a definition article, for risk-event
/// extraction.
#[derive(Debug, sqlx::FromRow)]
pub struct DefinitionClause {
	pub clause_id: i64,
	pub clause_title: String,
	pub clause_text: String,
}

pub async fn list_definition_clauses<'e, E>(executor: E) -> Result<Vec<DefinitionClause>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DefinitionClause>(
		"\
SELECT
	dc.id AS clause_id,
	dc.clause_title,
	dc.clause_text
FROM document_clause dc
JOIN document d ON dc.document_id = d.id
WHERE d.doc_type = 'terms'
	AND dc.clause_title IS NOT NULL
	AND dc.clause_title LIKE '%정의%'
ORDER BY dc.id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Proposal document with its attribute payload, for plan extraction.
#[derive(Debug, sqlx::FromRow)]
pub struct ProposalDocument {
	pub id: i64,
	pub attributes: Value,
}

pub async fn list_proposal_documents<'e, E>(executor: E) -> Result<Vec<ProposalDocument>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ProposalDocument>(
		"\
SELECT
	id,
	attributes
FROM document
WHERE doc_type = 'proposal'
ORDER BY id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Structured table row of one document with its first coverage link,
/// if any tier produced one.
#[derive(Debug, sqlx::FromRow)]
pub struct PlanRow {
	pub clause_id: i64,
	pub coverage_id: Option<i64>,
	pub structured_data: Value,
}

pub async fn list_plan_rows<'e, E>(executor: E, document_id: i64) -> Result<Vec<PlanRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PlanRow>(
		"\
SELECT
	dc.id AS clause_id,
	MIN(cc.coverage_id) AS coverage_id,
	dc.structured_data
FROM document_clause dc
LEFT JOIN clause_coverage cc ON cc.clause_id = dc.id
WHERE dc.document_id = $1
	AND dc.clause_type = 'table_row'
	AND dc.structured_data IS NOT NULL
GROUP BY dc.id, dc.structured_data
ORDER BY dc.id ASC",
	)
	.bind(document_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn nul_bytes_are_stripped_from_text() {
		assert_eq!(strip_nul("암\u{0}진단비"), "암진단비");
		assert_eq!(strip_nul("clean"), "clean");
	}

	#[test]
	fn nul_bytes_are_stripped_from_json_leaves() {
		let dirty = json!({
			"coverage_name": "암\u{0}진단비",
			"cells": ["3,000만원", "1\u{0}32"],
			"rows": 2
		});
		let cleaned = strip_json_nul(dirty);

		assert_eq!(cleaned["coverage_name"], "암진단비");
		assert_eq!(cleaned["cells"][1], "132");
		assert_eq!(cleaned["rows"], 2);
	}
}
