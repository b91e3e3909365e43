//! Carrier-specific benefit-table row layouts, keyed by company code.
//! Each parser is a pure function over the raw cell strings; unknown
//! codes fall back to the generic parser.

use dambo_domain::{
	amount::parse_amount,
	coverage::{Strictness, clean_coverage_name, filter_empty_cells, is_valid_coverage_name},
};
use regex::Regex;

use crate::parsers::StructuredCoverage;

pub type CarrierParser = fn(&[String], Strictness) -> Option<StructuredCoverage>;

pub fn parser_for(company_code: &str) -> Option<CarrierParser> {
	let parser: CarrierParser = match company_code.to_lowercase().as_str() {
		"samsung" => parse_samsung_row,
		"db" => parse_db_row,
		"kb" => parse_kb_row,
		"lotte" => parse_lotte_row,
		"meritz" => parse_meritz_row,
		"heungkuk" => parse_heungkuk_row,
		"hyundai" => parse_hyundai_row,
		"hanwha" => parse_hanwha_row,
		_ => return None,
	};

	Some(parser)
}

/// Category keywords Lotte prints as standalone group-header rows.
const LOTTE_CATEGORY_KEYWORDS: &[&str] =
	&["암관련", "뇌질환", "심장질환", "수술비", "기본계약", "골절/화상", "갱신계약"];

fn cell(cells: &[String], index: usize) -> &str {
	cells.get(index).map(|cell| cell.trim()).unwrap_or("")
}

/// Premiums are printed as plain comma-grouped digits, with or without
/// a trailing 원.
fn parse_premium(text: &str) -> Option<i64> {
	let digits: String =
		text.trim().trim_end_matches('원').chars().filter(|ch| *ch != ',').collect();

	if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
		return None;
	}

	digits.parse().ok().filter(|value| *value > 0)
}

fn build_row(
	name: &str,
	amount: &str,
	premium: &str,
	period: &str,
	strictness: Strictness,
) -> Option<StructuredCoverage> {
	if name.is_empty() || !is_valid_coverage_name(name, strictness) {
		return None;
	}

	let coverage_amount = parse_amount(amount);
	let premium = parse_premium(premium);

	if coverage_amount.is_none() && premium.is_none() {
		return None;
	}

	Some(StructuredCoverage {
		coverage_name: clean_coverage_name(name),
		coverage_amount,
		coverage_amount_text: (!amount.is_empty()).then(|| amount.to_string()),
		premium,
		premium_frequency: premium.map(|_| "월".to_string()),
		coverage_period: (!period.is_empty()).then(|| period.to_string()),
		..Default::default()
	})
}

/// Samsung: category column, then name, amount, premium, period. Rows
/// whose name cell is a bare payment term ("60개월", "20년") are group
/// footers, not coverages.
fn parse_samsung_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	let name = cell(cells, 1);

	if Regex::new(r"^\d+(개월|년)$").map(|re| re.is_match(name)).unwrap_or(false) {
		return None;
	}

	build_row(name, cell(cells, 2), cell(cells, 3), cell(cells, 4), strictness)
}

/// DB: six columns with a row number and a spacer before the name.
fn parse_db_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	if cells.len() < 6 {
		return None;
	}

	build_row(cell(cells, 2), cell(cells, 3), cell(cells, 4), cell(cells, 5), strictness)
}

/// KB pads rows with empty spacer cells; drop them first.
fn parse_kb_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	let cells = filter_empty_cells(cells);

	if cells.len() < 4 {
		return None;
	}

	build_row(cell(&cells, 1), cell(&cells, 2), cell(&cells, 3), "", strictness)
}

/// Lotte: category, name, amount, period, premium; category group
/// headers occupy a full row and must be skipped.
fn parse_lotte_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	let first = cell(cells, 0);

	if LOTTE_CATEGORY_KEYWORDS.contains(&first) {
		return None;
	}
	if first.chars().count() <= 4 && (first.contains("관련") || first.contains("질환")) {
		return None;
	}

	build_row(cell(cells, 1), cell(cells, 2), cell(cells, 4), cell(cells, 3), strictness)
}

/// Meritz: category, row number, then name, amount, premium, period.
fn parse_meritz_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	if cells.len() < 6 {
		return None;
	}

	build_row(cell(cells, 2), cell(cells, 3), cell(cells, 4), cell(cells, 5), strictness)
}

/// Heungkuk: spacer, name, period, amount, premium.
fn parse_heungkuk_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	build_row(cell(cells, 1), cell(cells, 3), cell(cells, 4), cell(cells, 2), strictness)
}

/// Hyundai prints wide eight-column rows in proposals and a compact
/// five-column layout elsewhere.
fn parse_hyundai_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	if cells.len() >= 8 {
		return build_row(cell(cells, 2), cell(cells, 6), cell(cells, 7), cell(cells, 5), strictness);
	}

	build_row(cell(cells, 1), cell(cells, 2), cell(cells, 3), cell(cells, 4), strictness)
}

/// Hanwha: row number, name, amount, premium, period.
fn parse_hanwha_row(cells: &[String], strictness: Strictness) -> Option<StructuredCoverage> {
	build_row(cell(cells, 1), cell(cells, 2), cell(cells, 3), cell(cells, 4), strictness)
}
