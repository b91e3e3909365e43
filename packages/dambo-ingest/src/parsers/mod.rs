//! Clause parsers. Terms documents go through the article splitter,
//! proposals through the table parsers, everything else through both.

pub mod carriers;
pub mod hybrid;
pub mod table;
pub mod text;

use dambo_domain::coverage::Strictness;
use dambo_storage::models::NewClause;
use serde::Serialize;

use crate::{
	Result,
	artifacts::{ConvertedDocument, IngestRecord},
};

/// Structured payload of one benefit-table row, stored as the clause's
/// `structured_data`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StructuredCoverage {
	pub coverage_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub coverage_amount: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub coverage_amount_text: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub premium: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub premium_frequency: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub coverage_period: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub conditions: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_gender: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_age_range: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParserKind {
	Text,
	Table,
	Hybrid,
}

pub fn parser_for_doc_type(doc_type: &str) -> ParserKind {
	match doc_type {
		"terms" => ParserKind::Text,
		"proposal" => ParserKind::Table,
		_ => ParserKind::Hybrid,
	}
}

/// Routes a converted document through the parser its doc type calls
/// for and returns clauses in document order.
pub fn parse_document(
	doc: &ConvertedDocument,
	record: &IngestRecord,
	strictness: Strictness,
) -> Result<Vec<NewClause>> {
	match parser_for_doc_type(&record.doc_type) {
		ParserKind::Text => Ok(text::parse(&text::section_blocks(doc))),
		ParserKind::Table => hybrid::parse_tables(doc, record, strictness),
		ParserKind::Hybrid => hybrid::parse(doc, record, strictness),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn doc_type_selects_the_parser() {
		assert_eq!(parser_for_doc_type("terms"), ParserKind::Text);
		assert_eq!(parser_for_doc_type("proposal"), ParserKind::Table);
		assert_eq!(parser_for_doc_type("business_spec"), ParserKind::Hybrid);
		assert_eq!(parser_for_doc_type("product_summary"), ParserKind::Hybrid);
	}

	#[test]
	fn structured_coverage_omits_absent_fields() {
		let row = StructuredCoverage {
			coverage_name: "암진단비".to_string(),
			coverage_amount: Some(30_000_000),
			coverage_amount_text: Some("3,000만원".to_string()),
			..Default::default()
		};
		let json = serde_json::to_value(&row).expect("serialize failed");

		assert_eq!(json["coverage_name"], "암진단비");
		assert_eq!(json["coverage_amount"], 30_000_000);
		assert!(json.get("premium").is_none());
	}
}
