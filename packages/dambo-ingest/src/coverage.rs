//! Coverage ontology extraction: promotes structured table rows into
//! `coverage` rows, one per `(product_id, coverage_code)`.

use sqlx::PgPool;

use dambo_domain::coverage::{
	clean_raw_coverage_name, extract_renewal_type, generate_coverage_code,
	infer_coverage_category,
};
use dambo_storage::{
	documents,
	ontology::{self, NewCoverage},
};

use crate::Result;

#[derive(Debug, Default)]
pub struct CoverageExtractionReport {
	pub scanned: usize,
	pub upserted: usize,
	pub invalid: usize,
}

/// Walks every coverage-bearing table row and upserts the coverage it
/// names. Rows whose names fail the cleaning ladder are counted, not
/// fatal.
pub async fn extract_coverages(pool: &PgPool) -> Result<CoverageExtractionReport> {
	let rows = documents::list_coverage_bearing_rows(pool).await?;
	let mut report = CoverageExtractionReport::default();

	for row in rows {
		report.scanned += 1;

		let Some(raw_name) = row.structured_data.get("coverage_name").and_then(|v| v.as_str())
		else {
			report.invalid += 1;

			continue;
		};
		let Some(coverage) = build_coverage(row.product_id, raw_name) else {
			report.invalid += 1;

			continue;
		};

		ontology::upsert_coverage(pool, &coverage).await?;

		report.upserted += 1;
	}

	tracing::info!(
		scanned = report.scanned,
		upserted = report.upserted,
		invalid = report.invalid,
		"coverage extraction finished"
	);

	Ok(report)
}

/// Runs the cleaning ladder and derives code, category, and renewal
/// type for one raw name.
pub fn build_coverage(product_id: i64, raw_name: &str) -> Option<NewCoverage> {
	let cleaned = clean_raw_coverage_name(raw_name)?;
	let category = infer_coverage_category(&cleaned.name);
	let renewal_type = cleaned
		.renewal_type
		.clone()
		.or_else(|| extract_renewal_type(&cleaned.name).map(str::to_string));

	Some(NewCoverage {
		product_id,
		coverage_code: generate_coverage_code(&cleaned.name),
		coverage_name: cleaned.name.clone(),
		coverage_category: category.to_string(),
		renewal_type,
		is_basic: cleaned.name.contains("기본계약"),
		clause_number: cleaned.clause_number,
		coverage_period: cleaned.coverage_period,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_a_coverage_from_a_raw_row_name() {
		let coverage = build_coverage(7, "3 암진단비(유사암 제외)").expect("should build");

		assert_eq!(coverage.product_id, 7);
		assert_eq!(coverage.coverage_name, "암진단비(유사암 제외)");
		assert_eq!(coverage.clause_number.as_deref(), Some("3"));
		assert!(!coverage.coverage_code.is_empty());
	}

	#[test]
	fn renewal_prefix_survives_the_ladder() {
		let coverage = build_coverage(1, "[갱신형] 뇌출혈진단비").expect("should build");

		assert_eq!(coverage.renewal_type.as_deref(), Some("갱신형"));
		assert_eq!(coverage.coverage_name, "뇌출혈진단비");
	}

	#[test]
	fn bare_periods_do_not_build() {
		assert!(build_coverage(1, "20년").is_none());
		assert!(build_coverage(1, "12345").is_none());
	}
}
