use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::{
	Result,
	embeddings::format_vector_text,
	models::{LinkedCoverage, SearchHit},
};

/// Parses the Korean amount rendering stored in embedding metadata into won.
/// Branch order matters: the comma form must win before the bare 원 branch.
const KOREAN_AMOUNT_SQL: &str = "\
(CASE
	WHEN ce.metadata -> 'structured_data' ->> 'coverage_amount' ~ '^[0-9,]+만원$' THEN
		(REPLACE(REGEXP_REPLACE(ce.metadata -> 'structured_data' ->> 'coverage_amount', '만원$', ''), ',', '')::bigint * 10000)
	WHEN ce.metadata -> 'structured_data' ->> 'coverage_amount' ~ '^[0-9]+억' THEN
		(REGEXP_REPLACE(ce.metadata -> 'structured_data' ->> 'coverage_amount', '억.*', '')::bigint * 100000000)
	WHEN ce.metadata -> 'structured_data' ->> 'coverage_amount' ~ '^[0-9]+천만원$' THEN
		(REGEXP_REPLACE(ce.metadata -> 'structured_data' ->> 'coverage_amount', '천만원$', '')::bigint * 10000000)
	WHEN ce.metadata -> 'structured_data' ->> 'coverage_amount' ~ '^[0-9]+원$' THEN
		REGEXP_REPLACE(ce.metadata -> 'structured_data' ->> 'coverage_amount', '원$', '')::bigint
	ELSE NULL
END)";

/// Typed filter set composed into a parameterized ANN query. Every field is
/// optional; `None` means unfiltered.
#[derive(Clone, Debug, Default)]
pub struct SearchFilter {
	pub company_id: Option<i64>,
	pub product_id: Option<i64>,
	pub doc_type: Option<String>,
	pub clause_type: Option<String>,
	pub coverage_ids: Option<Vec<i64>>,
	pub amount_min: Option<i64>,
	pub amount_max: Option<i64>,
	pub gender: Option<String>,
	pub age: Option<i32>,
}

impl SearchFilter {
	pub fn without_amount(&self) -> Self {
		let mut filter = self.clone();

		filter.amount_min = None;
		filter.amount_max = None;

		filter
	}

	pub fn with_doc_type(&self, doc_type: Option<&str>) -> Self {
		let mut filter = self.clone();

		filter.doc_type = doc_type.map(str::to_string);

		filter
	}

	pub fn with_clause_type(&self, clause_type: Option<&str>) -> Self {
		let mut filter = self.clone();

		filter.clause_type = clause_type.map(str::to_string);

		filter
	}
}

fn build_search_query<'a>(
	vec_text: &'a str,
	filter: &'a SearchFilter,
	limit: i64,
) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"\
SELECT
	dc.id AS clause_id,
	dc.clause_type,
	dc.clause_number,
	dc.clause_title,
	dc.clause_text,
	dc.structured_data,
	dc.page_number,
	1 - (ce.embedding <=> ",
	);

	builder.push_bind(vec_text);
	builder.push(
		"::vector) AS similarity,
	ce.metadata,
	d.doc_type,
	d.document_id,
	d.product_id,
	p.product_name,
	c.company_name
FROM clause_embedding ce
JOIN document_clause dc ON ce.clause_id = dc.id
JOIN document d ON dc.document_id = d.id
JOIN product p ON d.product_id = p.id
JOIN company c ON p.company_id = c.id
LEFT JOIN product_variant pv ON d.variant_id = pv.id
WHERE TRUE",
	);

	if let Some(company_id) = filter.company_id {
		builder.push("\n\tAND c.id = ");
		builder.push_bind(company_id);
	}
	if let Some(product_id) = filter.product_id {
		builder.push("\n\tAND d.product_id = ");
		builder.push_bind(product_id);
	}
	if let Some(doc_type) = filter.doc_type.as_deref() {
		builder.push("\n\tAND d.doc_type = ");
		builder.push_bind(doc_type);
	}
	if let Some(clause_type) = filter.clause_type.as_deref() {
		builder.push("\n\tAND dc.clause_type = ");
		builder.push_bind(clause_type);
	}
	if let Some(coverage_ids) = filter.coverage_ids.as_deref()
		&& !coverage_ids.is_empty()
	{
		builder.push(
			"\n\tAND EXISTS (
		SELECT 1 FROM jsonb_array_elements_text(ce.metadata -> 'coverage_ids') elem
		WHERE elem::bigint = ANY(",
		);
		builder.push_bind(coverage_ids.to_vec());
		builder.push("))");
	}
	if let Some(amount_min) = filter.amount_min {
		builder.push("\n\tAND ");
		builder.push(KOREAN_AMOUNT_SQL);
		builder.push(" >= ");
		builder.push_bind(amount_min);
	}
	if let Some(amount_max) = filter.amount_max {
		builder.push("\n\tAND ");
		builder.push(KOREAN_AMOUNT_SQL);
		builder.push(" <= ");
		builder.push_bind(amount_max);
	}
	if let Some(gender) = filter.gender.as_deref() {
		builder.push("\n\tAND (pv.target_gender IS NULL OR pv.target_gender = ");
		builder.push_bind(gender);
		builder.push(")");
	}
	if let Some(age) = filter.age {
		builder.push(
			"\n\tAND (pv.target_age_range IS NULL
		OR (pv.target_age_range LIKE '≤%' AND ",
		);
		builder.push_bind(age);
		builder.push(
			" <= SUBSTRING(pv.target_age_range FROM 2)::int)
		OR (pv.target_age_range LIKE '≥%' AND ",
		);
		builder.push_bind(age);
		builder.push(" >= SUBSTRING(pv.target_age_range FROM 2)::int))");
	}

	builder.push("\nORDER BY ce.embedding <=> ");
	builder.push_bind(vec_text);
	builder.push("::vector\nLIMIT ");
	builder.push_bind(limit);

	builder
}

/// Filtered ANN search. `ef_search` is applied with SET LOCAL so it only
/// affects this transaction.
pub async fn vector_search(
	pool: &PgPool,
	query_vec: &[f32],
	filter: &SearchFilter,
	limit: i64,
	ef_search: u32,
) -> Result<Vec<SearchHit>> {
	let vec_text = format_vector_text(query_vec);
	let mut tx = pool.begin().await?;

	sqlx::query(&format!("SET LOCAL hnsw.ef_search = {ef_search}")).execute(&mut *tx).await?;

	let mut builder = build_search_query(&vec_text, filter, limit);
	let hits = builder.build_query_as::<SearchHit>().fetch_all(&mut *tx).await?;

	tx.commit().await?;

	Ok(hits)
}

/// Coverages linked to a clause with their benefit rows, for context
/// enrichment.
pub async fn linked_coverages<'e, E>(executor: E, clause_id: i64) -> Result<Vec<LinkedCoverage>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, LinkedCoverage>(
		"\
SELECT
	cc.coverage_id,
	cov.coverage_name,
	cov.coverage_category,
	b.benefit_name,
	b.benefit_amount,
	b.benefit_amount_text
FROM clause_coverage cc
JOIN coverage cov ON cc.coverage_id = cov.id
LEFT JOIN benefit b ON b.coverage_id = cov.id
WHERE cc.clause_id = $1
ORDER BY cov.coverage_name ASC",
	)
	.bind(clause_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unfiltered_query_has_no_predicates() {
		let filter = SearchFilter::default();
		let builder = build_search_query("[0.1,0.2]", &filter, 30);
		let sql = builder.sql();

		assert!(sql.contains("WHERE TRUE"));
		assert!(!sql.contains("AND c.id"));
		assert!(!sql.contains("coverage_amount"));
	}

	#[test]
	fn filters_compose_into_predicates() {
		let filter = SearchFilter {
			company_id: Some(1),
			doc_type: Some("proposal".to_string()),
			clause_type: Some("table_row".to_string()),
			amount_min: Some(30_000_000),
			amount_max: Some(30_000_000),
			..Default::default()
		};
		let builder = build_search_query("[0.1,0.2]", &filter, 30);
		let sql = builder.sql();

		assert!(sql.contains("AND c.id ="));
		assert!(sql.contains("AND d.doc_type ="));
		assert!(sql.contains("AND dc.clause_type ="));
		// One CASE expression per amount bound.
		assert_eq!(sql.matches("CASE").count(), 2);
	}

	#[test]
	fn amount_case_orders_comma_form_before_bare_won() {
		let comma = KOREAN_AMOUNT_SQL.find("'^[0-9,]+만원$'").expect("Expected comma branch.");
		let bare = KOREAN_AMOUNT_SQL.find("'^[0-9]+원$'").expect("Expected bare branch.");

		assert!(comma < bare);
	}

	#[test]
	fn derived_filters_drop_only_their_fields() {
		let filter = SearchFilter {
			company_id: Some(1),
			doc_type: Some("proposal".to_string()),
			amount_min: Some(10),
			..Default::default()
		};
		let no_amount = filter.without_amount();
		let terms = filter.with_doc_type(Some("terms"));

		assert_eq!(no_amount.amount_min, None);
		assert_eq!(no_amount.company_id, Some(1));
		assert_eq!(terms.doc_type.as_deref(), Some("terms"));
		assert_eq!(terms.amount_min, Some(10));
	}
}
