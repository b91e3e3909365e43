//! Condition and exclusion mining over terms clauses already linked to
//! a coverage.

use regex::Regex;
use sqlx::PgPool;

use dambo_storage::{documents, entities};

use crate::Result;

/// Longest clause text stored verbatim on a condition or exclusion.
const MAX_STORED_TEXT: usize = 2_000;

#[derive(Debug, Default)]
pub struct ConditionReport {
	pub scanned: usize,
	pub conditions: u64,
	pub exclusions: u64,
}

pub async fn extract_conditions(pool: &PgPool) -> Result<ConditionReport> {
	let clauses = documents::list_linked_terms_clauses(pool).await?;
	let mut report = ConditionReport::default();

	for clause in clauses {
		report.scanned += 1;

		let title = clause.clause_title.as_deref().unwrap_or("");
		let text: String = clause.clause_text.chars().take(MAX_STORED_TEXT).collect();

		if title.contains("보장개시") || title.contains("면책기간") {
			let inserted = entities::insert_condition(
				pool,
				clause.coverage_id,
				"waiting_period",
				None,
				None,
				extract_waiting_days(&clause.clause_text),
				&text,
			)
			.await?;

			if inserted {
				report.conditions += 1;
			}
		} else if title.contains("가입나이") || title.contains("가입연령") {
			let (min_age, max_age) = extract_age_limits(&clause.clause_text);
			let inserted = entities::insert_condition(
				pool,
				clause.coverage_id,
				"age_limit",
				min_age,
				max_age,
				None,
				&text,
			)
			.await?;

			if inserted {
				report.conditions += 1;
			}
		} else if title.contains("지급하지 않")
			|| title.contains("면책")
			|| clause.clause_text.contains("보험금을 지급하지 않")
		{
			let is_absolute = clause.clause_text.contains("고의");
			let inserted = entities::insert_exclusion(
				pool,
				clause.coverage_id,
				"non_payment",
				&text,
				is_absolute,
			)
			.await?;

			if inserted {
				report.exclusions += 1;
			}
		}
	}

	tracing::info!(
		scanned = report.scanned,
		conditions = report.conditions,
		exclusions = report.exclusions,
		"condition extraction finished"
	);

	Ok(report)
}

fn extract_waiting_days(text: &str) -> Option<i32> {
	let re = Regex::new(r"(\d{1,3})\s*일").ok()?;
	let days: i32 = re.captures(text)?.get(1)?.as_str().parse().ok()?;

	(1..=365).contains(&days).then_some(days)
}

fn extract_age_limits(text: &str) -> (Option<i32>, Option<i32>) {
	let Ok(re) = Regex::new(r"(\d{1,3})\s*세") else { return (None, None) };
	let ages: Vec<i32> = re
		.captures_iter(text)
		.filter_map(|caps| caps.get(1)?.as_str().parse().ok())
		.filter(|age| (0..=100).contains(age))
		.collect();

	match ages.as_slice() {
		[] => (None, None),
		[only] => (Some(*only), None),
		_ => (ages.iter().min().copied(), ages.iter().max().copied()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn waiting_days_within_a_year_are_accepted() {
		assert_eq!(extract_waiting_days("계약일부터 90일이 지난 날의 다음날"), Some(90));
		assert_eq!(extract_waiting_days("대기기간 없음"), None);
		assert_eq!(extract_waiting_days("999일"), None);
	}

	#[test]
	fn age_limits_come_back_ordered() {
		assert_eq!(extract_age_limits("가입나이는 15세부터 65세까지"), (Some(15), Some(65)));
		assert_eq!(extract_age_limits("만 19세 이상"), (Some(19), None));
		assert_eq!(extract_age_limits("제한 없음"), (None, None));
	}

	#[test]
	fn out_of_range_ages_are_ignored() {
		assert_eq!(extract_age_limits("120세까지"), (None, None));
	}
}
