//! Combined parser for business specs and summaries: prose pages become
//! text blocks, benefit tables become structured rows. Proposals reuse
//! only the table half.

use dambo_domain::coverage::{Strictness, is_benefit_table};
use dambo_storage::models::NewClause;

use crate::{
	Result,
	artifacts::{ConvertedDocument, IngestRecord},
	parsers::{StructuredCoverage, carriers, table},
};

/// Shortest page text worth keeping as a text block.
const MIN_TEXT_BLOCK_CHARS: usize = 20;
/// Longest first line still usable as a block title.
const MAX_TITLE_CHARS: usize = 100;

pub fn parse(
	doc: &ConvertedDocument,
	record: &IngestRecord,
	strictness: Strictness,
) -> Result<Vec<NewClause>> {
	let mut clauses = parse_text_blocks(doc);

	clauses.extend(parse_tables(doc, record, strictness)?);

	Ok(clauses)
}

pub fn parse_text_blocks(doc: &ConvertedDocument) -> Vec<NewClause> {
	let mut clauses = Vec::new();

	for page in &doc.text.pages {
		let text = page.text.trim();

		if text.chars().count() < MIN_TEXT_BLOCK_CHARS {
			continue;
		}

		clauses.push(NewClause {
			clause_type: "text_block".to_string(),
			clause_number: None,
			clause_title: extract_block_title(text),
			clause_text: text.to_string(),
			structured_data: None,
			section_type: doc.section_type_for_page(page.page).map(str::to_string),
			page_number: Some(page.page),
			hierarchy_level: 0,
		});
	}

	clauses
}

/// Parses every benefit table in the document. The carrier's layout
/// parser is preferred; unknown company codes use the generic one. Rows
/// that fail to parse are dropped, the table itself never aborts.
pub fn parse_tables(
	doc: &ConvertedDocument,
	record: &IngestRecord,
	strictness: Strictness,
) -> Result<Vec<NewClause>> {
	let carrier = carriers::parser_for(&record.company_code);
	let mut clauses = Vec::new();

	for entry in &doc.tables_index.tables {
		let rows = doc.table(&entry.table_id)?;

		if !is_benefit_table(&rows) {
			continue;
		}

		for cells in &rows {
			let parsed = match carrier {
				Some(parse_row) => parse_row(cells, strictness),
				None => table::parse_table_row(cells, strictness),
			};
			let Some(mut structured) = parsed else { continue };

			structured.target_gender = record.target_gender().map(str::to_string);
			structured.target_age_range = record.target_age_range().map(str::to_string);

			clauses.push(NewClause {
				clause_type: "table_row".to_string(),
				clause_number: None,
				clause_title: None,
				clause_text: format_table_row_text(&structured),
				structured_data: Some(serde_json::to_value(&structured)?),
				section_type: None,
				page_number: Some(entry.page),
				hierarchy_level: 0,
			});
		}
	}

	Ok(clauses)
}

fn extract_block_title(text: &str) -> Option<String> {
	let first_line = text.lines().next()?.trim();

	if first_line.is_empty() || first_line.chars().count() >= MAX_TITLE_CHARS {
		return None;
	}

	Some(first_line.to_string())
}

/// Human-readable rendering of a structured row, used as the clause
/// text the embedder sees.
pub fn format_table_row_text(structured: &StructuredCoverage) -> String {
	let mut parts = vec![structured.coverage_name.clone()];

	if let Some(amount_text) = &structured.coverage_amount_text {
		parts.push(format!("가입금액: {amount_text}"));
	}
	if let Some(premium) = structured.premium
		&& let Some(frequency) = &structured.premium_frequency
	{
		parts.push(format!("{frequency}보험료: {}원", format_thousands(premium)));
	}
	if let Some(conditions) = &structured.conditions {
		parts.push(format!("조건: {conditions}"));
	}
	if let Some(gender) = &structured.target_gender {
		parts.push(format!("성별: {gender}"));
	}
	if let Some(age_range) = &structured.target_age_range {
		parts.push(format!("연령: {age_range}"));
	}

	parts.join(", ")
}

fn format_thousands(value: i64) -> String {
	let digits = value.abs().to_string();
	let mut grouped = String::new();

	for (index, ch) in digits.chars().enumerate() {
		if index > 0 && (digits.len() - index) % 3 == 0 {
			grouped.push(',');
		}

		grouped.push(ch);
	}

	if value < 0 { format!("-{grouped}") } else { grouped }
}

#[cfg(test)]
mod tests {
	use dambo_testkit::fixtures::{self, ConvertedDocSpec};

	use super::*;

	fn record(company_code: &str, doc_type: &str) -> IngestRecord {
		IngestRecord {
			document_id: "doc_001".to_string(),
			company_code: company_code.to_string(),
			company_name: "한화손해보험".to_string(),
			product_code: "P100".to_string(),
			product_name: "무배당 건강보험".to_string(),
			version: "1.0".to_string(),
			effective_date: None,
			doc_type: doc_type.to_string(),
			doc_subtype: None,
			file_path: "doc_001.pdf".to_string(),
			attributes: Some(serde_json::json!({
				"target_gender": "male",
				"target_age_range": "≤40",
			})),
		}
	}

	fn converted(tables: Vec<fixtures::ConvertedTable>) -> (tempfile::TempDir, ConvertedDocument) {
		let spec = ConvertedDocSpec {
			company_name: "한화손해보험".to_string(),
			document_id: "doc_001".to_string(),
			product_name: "무배당 건강보험".to_string(),
			doc_type: "business_spec".to_string(),
			pages: vec![fixtures::page(
				1,
				"상품 개요\n이 상품은 암과 뇌혈관 질환을 집중 보장하는 건강보험입니다.",
			)],
			tables,
		};
		let (root, dir) = fixtures::write_converted_document(&spec).expect("fixture failed");
		let doc = ConvertedDocument::load(&dir).expect("load failed");

		(root, doc)
	}

	#[test]
	fn benefit_rows_carry_structured_data_and_rendered_text() {
		let (_root, doc) = converted(vec![fixtures::table(
			1,
			&[
				&["번호", "담보명", "가입금액", "보험료", "보험기간"],
				&["1", "암진단비", "3,000만원", "12,500원", "100세만기"],
			],
		)]);
		let clauses =
			parse_tables(&doc, &record("hanwha", "business_spec"), Strictness::Lenient)
				.expect("parse failed");

		assert_eq!(clauses.len(), 1);
		assert_eq!(clauses[0].clause_type, "table_row");
		assert_eq!(
			clauses[0].clause_text,
			"암진단비, 가입금액: 3,000만원, 월보험료: 12,500원, 성별: male, 연령: ≤40"
		);

		let structured = clauses[0].structured_data.as_ref().expect("missing structured data");

		assert_eq!(structured["coverage_name"], "암진단비");
		assert_eq!(structured["coverage_amount"], 30_000_000);
		assert_eq!(structured["premium"], 12_500);
		assert_eq!(structured["target_gender"], "male");
	}

	#[test]
	fn non_benefit_tables_are_ignored() {
		let (_root, doc) = converted(vec![fixtures::table(
			1,
			&[&["구분", "내용"], &["회사", "한화손해보험"]],
		)]);
		let clauses = parse_tables(&doc, &record("hanwha", "business_spec"), Strictness::Lenient)
			.expect("parse failed");

		assert!(clauses.is_empty());
	}

	#[test]
	fn unknown_company_uses_the_generic_parser() {
		let (_root, doc) = converted(vec![fixtures::table(
			1,
			&[
				&["담보명", "가입금액", "보험료"],
				&["뇌출혈진단비", "1,000만원", "3,200원"],
			],
		)]);
		let clauses = parse_tables(&doc, &record("unknown_carrier", "business_spec"), Strictness::Lenient)
			.expect("parse failed");

		assert_eq!(clauses.len(), 1);

		let structured = clauses[0].structured_data.as_ref().expect("missing structured data");

		assert_eq!(structured["coverage_name"], "뇌출혈진단비");
	}

	#[test]
	fn prose_pages_become_text_blocks() {
		let (_root, doc) = converted(Vec::new());
		let clauses = parse_text_blocks(&doc);

		assert_eq!(clauses.len(), 1);
		assert_eq!(clauses[0].clause_type, "text_block");
		assert_eq!(clauses[0].clause_title.as_deref(), Some("상품 개요"));
		assert_eq!(clauses[0].page_number, Some(1));
	}

	#[test]
	fn thousands_are_comma_grouped() {
		assert_eq!(format_thousands(1_234_567), "1,234,567");
		assert_eq!(format_thousands(500), "500");
	}
}
