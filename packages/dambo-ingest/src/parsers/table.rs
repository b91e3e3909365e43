//! Generic benefit-table row parser, used when no carrier-specific
//! layout is registered for the document's company.

use dambo_domain::{
	amount::parse_amount,
	coverage::{Strictness, clean_coverage_name, is_header_row, is_valid_coverage_name},
};

use crate::parsers::StructuredCoverage;

/// Parses one table row by locating the coverage name in the leading
/// cells and reading every parseable amount from the rest. The largest
/// amount is the coverage amount; the smallest, when distinct and above
/// one won, is the monthly premium.
pub fn parse_table_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	if cells.len() < 2 || is_header_row(cells) {
		return None;
	}

	let (name_index, raw_name) = extract_coverage_name(cells)?;
	if !is_valid_coverage_name(&raw_name, strictness) {
		return None;
	}

	let mut amounts: Vec<(i64, String)> = cells
		.iter()
		.enumerate()
		.filter(|(index, _)| *index != name_index)
		.filter_map(|(_, cell)| parse_amount(cell).map(|value| (value, cell.trim().to_string())))
		.collect();

	amounts.sort_by(|a, b| b.0.cmp(&a.0));

	let coverage = amounts.first().cloned();
	let premium = match amounts.last() {
		Some((value, _)) if amounts.len() > 1 && *value > 1 => Some(*value),
		_ => None,
	};

	if coverage.is_none() && premium.is_none() {
		return None;
	}

	Some(StructuredCoverage {
		coverage_name: clean_coverage_name(&raw_name),
		coverage_amount: coverage.as_ref().map(|(value, _)| *value),
		coverage_amount_text: coverage.map(|(_, text)| text),
		premium,
		premium_frequency: premium.map(|_| "월".to_string()),
		..Default::default()
	})
}

/// Scans the first three cells for something name-like: non-empty, not
/// a bare number, not an amount, longer than two characters.
fn extract_coverage_name(cells: &[String]) -> Option<(usize, String)> {
	for (index, cell) in cells.iter().take(3).enumerate() {
		let trimmed = cell.trim();

		if trimmed.is_empty() {
			continue;
		}
		if trimmed.replace('.', "").chars().all(|ch| ch.is_ascii_digit()) {
			continue;
		}
		if trimmed.contains("만원") || trimmed.contains('억') || trimmed.contains('원') {
			continue;
		}
		if trimmed.chars().count() <= 2 {
			continue;
		}

		return Some((index, trimmed.to_string()));
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(cells: &[&str]) -> Vec<String> {
		cells.iter().map(|cell| cell.to_string()).collect()
	}

	#[test]
	fn largest_amount_is_coverage_and_smallest_is_premium() {
		let parsed = parse_table_row(&row(&["1", "암진단비", "3,000만원", "12,500원"]), Strictness::Lenient)
			.expect("row should parse");

		assert_eq!(parsed.coverage_name, "암진단비");
		assert_eq!(parsed.coverage_amount, Some(30_000_000));
		assert_eq!(parsed.coverage_amount_text.as_deref(), Some("3,000만원"));
		assert_eq!(parsed.premium, Some(12_500));
		assert_eq!(parsed.premium_frequency.as_deref(), Some("월"));
	}

	#[test]
	fn single_amount_yields_no_premium() {
		let parsed = parse_table_row(&row(&["뇌출혈진단비", "1,000만원"]), Strictness::Lenient)
			.expect("row should parse");

		assert_eq!(parsed.coverage_amount, Some(10_000_000));
		assert!(parsed.premium.is_none());
	}

	#[test]
	fn header_rows_are_skipped() {
		assert!(parse_table_row(&row(&["담보명", "가입금액", "보험료"]), Strictness::Lenient).is_none());
	}

	#[test]
	fn amountless_rows_are_dropped() {
		assert!(parse_table_row(&row(&["암진단비", "해당 약관 참조"]), Strictness::Lenient).is_none());
	}

	#[test]
	fn name_search_skips_numbers_and_amount_cells() {
		let parsed = parse_table_row(&row(&["12", "1,000만원", "제자리암진단비", "5,000원"]), Strictness::Lenient)
			.expect("row should parse");

		assert_eq!(parsed.coverage_name, "제자리암진단비");
	}
}
