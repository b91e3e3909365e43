use sqlx::PgExecutor;

use crate::Result;

#[derive(Debug, sqlx::FromRow)]
pub struct PlanSummary {
	pub plan_id: i64,
	pub company_name: String,
	pub product_name: String,
	pub target_gender: Option<String>,
	pub target_age: Option<i32>,
	pub insurance_period: Option<String>,
	pub total_premium: Option<i64>,
	pub coverage_count: i64,
}

pub async fn list_plans<'e, E>(executor: E) -> Result<Vec<PlanSummary>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PlanSummary>(
		"\
SELECT
	pl.id AS plan_id,
	c.company_name,
	p.product_name,
	pl.target_gender,
	pl.target_age,
	pl.insurance_period,
	pl.total_premium,
	COUNT(pc.coverage_id) AS coverage_count
FROM plan pl
JOIN document d ON pl.document_id = d.id
JOIN product p ON d.product_id = p.id
JOIN company c ON p.company_id = c.id
LEFT JOIN plan_coverage pc ON pc.plan_id = pl.id
GROUP BY pl.id, c.company_name, p.product_name
ORDER BY c.company_name ASC, pl.id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn insert_benefit<'e, E>(
	executor: E,
	coverage_id: i64,
	benefit_name: &str,
	benefit_type: &str,
	benefit_amount: Option<i64>,
	benefit_amount_text: Option<&str>,
	payment_frequency: &str,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO benefit (
	coverage_id,
	benefit_name,
	benefit_type,
	benefit_amount,
	benefit_amount_text,
	payment_frequency
)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (coverage_id, benefit_name) DO NOTHING",
	)
	.bind(coverage_id)
	.bind(benefit_name)
	.bind(benefit_type)
	.bind(benefit_amount)
	.bind(benefit_amount_text)
	.bind(payment_frequency)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn insert_risk_event<'e, E>(
	executor: E,
	event_type: &str,
	event_name: &str,
	severity_level: Option<&str>,
	icd_code_pattern: Option<&str>,
	description: Option<&str>,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO risk_event (event_type, event_name, severity_level, icd_code_pattern, description)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (event_type, event_name) DO NOTHING",
	)
	.bind(event_type)
	.bind(event_name)
	.bind(severity_level)
	.bind(icd_code_pattern)
	.bind(description)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Conditions have no natural key; duplicates are suppressed by comparing
/// the first 200 characters of the text for the same coverage.
pub async fn insert_condition<'e, E>(
	executor: E,
	coverage_id: i64,
	condition_type: &str,
	min_age: Option<i32>,
	max_age: Option<i32>,
	waiting_period_days: Option<i32>,
	condition_text: &str,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO condition (
	coverage_id,
	condition_type,
	min_age,
	max_age,
	waiting_period_days,
	condition_text
)
SELECT $1, $2, $3, $4, $5, $6
WHERE NOT EXISTS (
	SELECT 1 FROM condition
	WHERE coverage_id = $1 AND LEFT(condition_text, 200) = LEFT($6, 200)
)",
	)
	.bind(coverage_id)
	.bind(condition_type)
	.bind(min_age)
	.bind(max_age)
	.bind(waiting_period_days)
	.bind(condition_text)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn insert_exclusion<'e, E>(
	executor: E,
	coverage_id: i64,
	exclusion_type: &str,
	exclusion_text: &str,
	is_absolute: bool,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO exclusion (coverage_id, exclusion_type, exclusion_text, is_absolute)
SELECT $1, $2, $3, $4
WHERE NOT EXISTS (
	SELECT 1 FROM exclusion
	WHERE coverage_id = $1 AND LEFT(exclusion_text, 200) = LEFT($3, 200)
)",
	)
	.bind(coverage_id)
	.bind(exclusion_type)
	.bind(exclusion_text)
	.bind(is_absolute)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn insert_plan<'e, E>(
	executor: E,
	document_id: i64,
	target_gender: Option<&str>,
	target_age: Option<i32>,
	insurance_period: Option<&str>,
	payment_period: Option<&str>,
	total_premium: Option<i64>,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (id,): (i64,) = sqlx::query_as(
		"\
INSERT INTO plan (
	document_id,
	target_gender,
	target_age,
	insurance_period,
	payment_period,
	total_premium
)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING id",
	)
	.bind(document_id)
	.bind(target_gender)
	.bind(target_age)
	.bind(insurance_period)
	.bind(payment_period)
	.bind(total_premium)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

pub async fn insert_plan_coverage<'e, E>(
	executor: E,
	plan_id: i64,
	coverage_id: i64,
	sum_insured: Option<i64>,
	premium: Option<i64>,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO plan_coverage (plan_id, coverage_id, sum_insured, premium)
VALUES ($1, $2, $3, $4)
ON CONFLICT (plan_id, coverage_id) DO NOTHING",
	)
	.bind(plan_id)
	.bind(coverage_id)
	.bind(sum_insured)
	.bind(premium)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}
