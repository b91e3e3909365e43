use sqlx::{PgExecutor, QueryBuilder};

use crate::{
	Error, Result,
	models::{
		CompanyCatalogEntry, Coverage, CoverageCatalogEntry, DiseaseCatalogEntry, MappingStat,
		ProductCatalogEntry,
	},
};

/// Natural-key upsert. Existing rows keep their attributes; the no-op update
/// exists only so RETURNING yields the id on conflict.
pub async fn upsert_company<'e, E>(
	executor: E,
	company_name: &str,
	company_code: &str,
	business_type: Option<&str>,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO company (company_name, company_code, business_type)
VALUES ($1, $2, $3)
ON CONFLICT (company_code) DO UPDATE
SET company_code = EXCLUDED.company_code
RETURNING id",
	)
	.bind(company_name)
	.bind(company_code)
	.bind(business_type)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

pub async fn upsert_product<'e, E>(
	executor: E,
	company_id: i64,
	product_code: &str,
	product_name: &str,
	business_type: Option<&str>,
	version: &str,
	effective_date: Option<&str>,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO product (company_id, product_code, product_name, business_type, version, effective_date)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (company_id, product_code, version) DO UPDATE
SET product_code = EXCLUDED.product_code
RETURNING id",
	)
	.bind(company_id)
	.bind(product_code)
	.bind(product_name)
	.bind(business_type)
	.bind(version)
	.bind(effective_date)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

pub async fn upsert_variant<'e, E>(
	executor: E,
	product_id: i64,
	variant_code: &str,
	target_gender: Option<&str>,
	target_age_range: Option<&str>,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO product_variant (product_id, variant_code, target_gender, target_age_range)
VALUES ($1, $2, $3, $4)
ON CONFLICT (product_id, variant_code) DO UPDATE
SET variant_code = EXCLUDED.variant_code
RETURNING id",
	)
	.bind(product_id)
	.bind(variant_code)
	.bind(target_gender)
	.bind(target_age_range)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

#[derive(Clone, Debug)]
pub struct NewCoverage {
	pub product_id: i64,
	pub coverage_code: String,
	pub coverage_name: String,
	pub coverage_category: String,
	pub renewal_type: Option<String>,
	pub is_basic: bool,
	pub clause_number: Option<String>,
	pub coverage_period: Option<String>,
}

/// Insertion-only upsert keyed by `(product_id, coverage_code)`. The first
/// ingested attributes win.
pub async fn upsert_coverage<'e, E>(executor: E, coverage: &NewCoverage) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO coverage (
	product_id,
	coverage_code,
	coverage_name,
	coverage_category,
	renewal_type,
	is_basic,
	clause_number,
	coverage_period
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (product_id, coverage_code) DO UPDATE
SET coverage_code = EXCLUDED.coverage_code
RETURNING id",
	)
	.bind(coverage.product_id)
	.bind(coverage.coverage_code.as_str())
	.bind(coverage.coverage_name.as_str())
	.bind(coverage.coverage_category.as_str())
	.bind(coverage.renewal_type.as_deref())
	.bind(coverage.is_basic)
	.bind(coverage.clause_number.as_deref())
	.bind(coverage.coverage_period.as_deref())
	.fetch_one(executor)
	.await?;

	Ok(id)
}

/// Sets the parent of a coverage after checking that the parent's ancestor
/// chain does not already contain the child. Parent links form a DAG.
pub async fn set_coverage_parent(
	pool: &sqlx::PgPool,
	coverage_id: i64,
	parent_coverage_id: i64,
) -> Result<()> {
	if coverage_id == parent_coverage_id {
		return Err(Error::InvalidArgument(format!(
			"Coverage {coverage_id} cannot be its own parent."
		)));
	}

	let (cycle,): (bool,) = sqlx::query_as(
		"\
WITH RECURSIVE ancestors AS (
	SELECT id, parent_coverage_id FROM coverage WHERE id = $1
	UNION ALL
	SELECT c.id, c.parent_coverage_id
	FROM coverage c
	JOIN ancestors a ON c.id = a.parent_coverage_id
)
SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = $2)",
	)
	.bind(parent_coverage_id)
	.bind(coverage_id)
	.fetch_one(pool)
	.await?;

	if cycle {
		return Err(Error::InvalidArgument(format!(
			"Setting parent {parent_coverage_id} on coverage {coverage_id} would create a cycle."
		)));
	}

	sqlx::query("UPDATE coverage SET parent_coverage_id = $1 WHERE id = $2")
		.bind(parent_coverage_id)
		.bind(coverage_id)
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn list_product_coverages<'e, E>(executor: E, product_id: i64) -> Result<Vec<Coverage>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Coverage>(
		"\
SELECT
	id,
	product_id,
	coverage_code,
	coverage_name,
	coverage_category,
	renewal_type,
	is_basic,
	clause_number,
	coverage_period,
	parent_coverage_id,
	created_at
FROM coverage
WHERE product_id = $1
ORDER BY coverage_name ASC",
	)
	.bind(product_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// A later linker tier never overwrites an earlier mapping; conflicts on
/// `(clause_id, coverage_id)` are silent no-ops.
pub async fn insert_clause_coverage<'e, E>(
	executor: E,
	clause_id: i64,
	coverage_id: i64,
	relevance_score: f32,
	extraction_method: &str,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO clause_coverage (clause_id, coverage_id, relevance_score, extraction_method)
VALUES ($1, $2, $3, $4)
ON CONFLICT (clause_id, coverage_id) DO NOTHING",
	)
	.bind(clause_id)
	.bind(coverage_id)
	.bind(relevance_score)
	.bind(extraction_method)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

#[derive(Clone, Debug)]
pub struct ClauseCoverageInsert {
	pub clause_id: i64,
	pub coverage_id: i64,
	pub relevance_score: f32,
}

pub async fn insert_clause_coverages<'e, E>(
	executor: E,
	inserts: Vec<ClauseCoverageInsert>,
	extraction_method: &str,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	if inserts.is_empty() {
		return Ok(0);
	}

	let mut builder = QueryBuilder::new(
		"\
INSERT INTO clause_coverage (
	clause_id,
	coverage_id,
	relevance_score,
	extraction_method
) ",
	);

	builder.push_values(inserts, |mut b, item| {
		b.push_bind(item.clause_id)
			.push_bind(item.coverage_id)
			.push_bind(item.relevance_score)
			.push_bind(extraction_method.to_string());
	});
	builder.push(" ON CONFLICT (clause_id, coverage_id) DO NOTHING");

	let result = builder.build().execute(executor).await?;

	Ok(result.rows_affected())
}

pub async fn mapping_stats<'e, E>(executor: E) -> Result<Vec<MappingStat>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, MappingStat>(
		"\
SELECT
	extraction_method,
	COUNT(*) AS mapped_pairs,
	COUNT(DISTINCT clause_id) AS distinct_clauses
FROM clause_coverage
GROUP BY extraction_method
ORDER BY extraction_method ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_companies<'e, E>(executor: E) -> Result<Vec<CompanyCatalogEntry>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, CompanyCatalogEntry>(
		"SELECT id, company_name, company_code FROM company ORDER BY company_name ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_products<'e, E>(executor: E) -> Result<Vec<ProductCatalogEntry>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ProductCatalogEntry>(
		"\
SELECT p.id, p.product_name, c.company_name
FROM product p
JOIN company c ON p.company_id = c.id
ORDER BY p.product_name ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Coverage names known to the ontology plus names seen only inside
/// embedding metadata. The latter carry no id.
pub async fn list_coverage_names<'e, E>(executor: E) -> Result<Vec<CoverageCatalogEntry>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, CoverageCatalogEntry>(
		"\
SELECT id, coverage_name
FROM (
	SELECT DISTINCT ON (coverage_name) id, coverage_name
	FROM coverage
	ORDER BY coverage_name, id
) known
UNION
SELECT NULL::bigint AS id, extra.coverage_name
FROM (
	SELECT DISTINCT ce.metadata -> 'structured_data' ->> 'coverage_name' AS coverage_name
	FROM clause_embedding ce
	WHERE ce.metadata -> 'structured_data' ->> 'coverage_name' IS NOT NULL
		AND ce.metadata -> 'structured_data' ->> 'coverage_name' != ''
) extra
WHERE extra.coverage_name NOT IN (SELECT coverage_name FROM coverage)
ORDER BY coverage_name ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_diseases<'e, E>(executor: E, limit: i64) -> Result<Vec<DiseaseCatalogEntry>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DiseaseCatalogEntry>(
		"\
SELECT code, COALESCE(description_kr, code) AS name
FROM disease_code
ORDER BY code ASC
LIMIT $1",
	)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
