//! Plan extraction: one plan per proposal document, with a plan-coverage
//! link per structured row that mapped to a coverage.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgPool;

use dambo_storage::{documents, entities};

use crate::Result;

#[derive(Debug, Default)]
pub struct PlanReport {
	pub plans: usize,
	pub linked_rows: u64,
}

pub async fn extract_plans(pool: &PgPool) -> Result<PlanReport> {
	let proposals = documents::list_proposal_documents(pool).await?;
	let mut report = PlanReport::default();

	for proposal in proposals {
		let rows = documents::list_plan_rows(pool, proposal.id).await?;

		if rows.is_empty() {
			continue;
		}

		let total_premium = total_premium(&rows);
		let insurance_period = dominant_period(&rows);
		let plan_id = entities::insert_plan(
			pool,
			proposal.id,
			attr_str(&proposal.attributes, "target_gender").as_deref(),
			attr_age(&proposal.attributes),
			insurance_period.as_deref(),
			attr_str(&proposal.attributes, "payment_period").as_deref(),
			total_premium,
		)
		.await?;

		report.plans += 1;

		for row in &rows {
			let Some(coverage_id) = row.coverage_id else { continue };
			let sum_insured = row.structured_data.get("coverage_amount").and_then(Value::as_i64);
			let premium = row.structured_data.get("premium").and_then(Value::as_i64);
			let linked =
				entities::insert_plan_coverage(pool, plan_id, coverage_id, sum_insured, premium)
					.await?;

			if linked {
				report.linked_rows += 1;
			}
		}
	}

	tracing::info!(plans = report.plans, linked_rows = report.linked_rows, "plan extraction finished");

	Ok(report)
}

fn attr_str(attributes: &Value, key: &str) -> Option<String> {
	attributes.get(key).and_then(Value::as_str).map(str::to_string)
}

fn attr_age(attributes: &Value) -> Option<i32> {
	attributes.get("target_age").and_then(Value::as_i64).map(|age| age as i32)
}

fn total_premium(rows: &[documents::PlanRow]) -> Option<i64> {
	let premiums: Vec<i64> = rows
		.iter()
		.filter_map(|row| row.structured_data.get("premium").and_then(Value::as_i64))
		.collect();

	if premiums.is_empty() { None } else { Some(premiums.iter().sum()) }
}

/// The most frequent coverage period among the rows stands in for the
/// plan's insurance period.
fn dominant_period(rows: &[documents::PlanRow]) -> Option<String> {
	let mut counts: HashMap<&str, usize> = HashMap::new();

	for row in rows {
		if let Some(period) = row.structured_data.get("coverage_period").and_then(Value::as_str) {
			*counts.entry(period).or_default() += 1;
		}
	}

	counts
		.into_iter()
		.max_by_key(|(_, count)| *count)
		.map(|(period, _)| period.to_string())
}

#[cfg(test)]
mod tests {
	use documents::PlanRow;

	use super::*;

	fn row(premium: Option<i64>, period: Option<&str>) -> PlanRow {
		let mut structured = serde_json::json!({ "coverage_name": "암진단비" });

		if let Some(premium) = premium {
			structured["premium"] = premium.into();
		}
		if let Some(period) = period {
			structured["coverage_period"] = period.into();
		}

		PlanRow { clause_id: 1, coverage_id: None, structured_data: structured }
	}

	#[test]
	fn premiums_are_summed_over_rows() {
		let rows =
			vec![row(Some(12_000), None), row(Some(3_500), None), row(None, None)];

		assert_eq!(total_premium(&rows), Some(15_500));
		assert_eq!(total_premium(&[row(None, None)]), None);
	}

	#[test]
	fn the_most_common_period_wins() {
		let rows = vec![
			row(None, Some("100세만기")),
			row(None, Some("100세만기")),
			row(None, Some("20년만기")),
		];

		assert_eq!(dominant_period(&rows).as_deref(), Some("100세만기"));
		assert_eq!(dominant_period(&[row(None, None)]), None);
	}
}
