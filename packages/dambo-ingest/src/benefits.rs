//! Benefit extraction: every linked table row contributes one benefit
//! per coverage it maps to.

use sqlx::PgPool;

use dambo_domain::{amount::parse_benefit_amount, coverage::infer_benefit_type};
use dambo_storage::{documents, entities};

use crate::Result;

#[derive(Debug, Default)]
pub struct BenefitReport {
	pub scanned: usize,
	pub inserted: u64,
}

pub async fn extract_benefits(pool: &PgPool) -> Result<BenefitReport> {
	let rows = documents::list_linked_table_rows(pool).await?;
	let mut report = BenefitReport::default();

	for row in rows {
		report.scanned += 1;

		let Some(name) = row.structured_data.get("coverage_name").and_then(|v| v.as_str())
		else {
			continue;
		};
		let amount = row
			.structured_data
			.get("coverage_amount")
			.and_then(|v| v.as_i64())
			.or_else(|| {
				row.structured_data
					.get("coverage_amount_text")
					.and_then(|v| v.as_str())
					.and_then(parse_benefit_amount)
			});
		let amount_text =
			row.structured_data.get("coverage_amount_text").and_then(|v| v.as_str());
		let inserted = entities::insert_benefit(
			pool,
			row.coverage_id,
			name,
			infer_benefit_type(name),
			amount,
			amount_text,
			"once",
		)
		.await?;

		if inserted {
			report.inserted += 1;
		}
	}

	tracing::info!(scanned = report.scanned, inserted = report.inserted, "benefit extraction finished");

	Ok(report)
}
