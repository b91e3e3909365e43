//! Turns a source PDF into the four on-disk artifacts the parsers read.

use std::{collections::HashMap, fs, path::Path};

use regex::Regex;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
	Result,
	artifacts::{
		DocumentMetadata, PageText, Section, SectionsArtifact, TableIndexEntry,
		TablesIndexArtifact, TextArtifact,
	},
	source::PageSource,
};

pub const CONVERTER_VERSION: &str = "2.0.0";

/// Section headings recognized in Korean policy documents, checked in
/// order against short standalone lines.
const SECTION_TYPES: &[(&str, &str)] = &[
	("특별약관", r"특별\s*약관"),
	("보통약관", r"보통\s*약관"),
	("별표", r"별\s*표"),
	("부칙", r"부\s*칙"),
];

/// Heading lines longer than this are treated as body text.
const MAX_HEADING_CHARS: usize = 60;

#[derive(Clone, Debug)]
pub struct ConvertRequest {
	pub document_id: String,
	pub company_name: String,
	pub product_name: String,
	pub doc_type: String,
	pub version: String,
	pub effective_date: Option<String>,
	pub source_file: String,
	pub file_size_bytes: u64,
}

#[derive(Debug)]
pub struct ConvertReport {
	pub total_pages: u32,
	pub processed_pages: u32,
	pub tables: usize,
	pub sections: usize,
}

/// Converts one document and writes its artifact tree under
/// `<out_root>/<company_name>/<document_id>/`.
pub fn convert_document(
	source: &dyn PageSource,
	request: &ConvertRequest,
	out_root: &Path,
) -> Result<ConvertReport> {
	let doc_dir = out_root.join(&request.company_name).join(&request.document_id);
	let tables_dir = doc_dir.join("tables");

	fs::create_dir_all(&tables_dir)?;

	let mut pages = Vec::new();
	let mut table_index = Vec::new();
	let mut table_bodies: HashMap<String, Vec<Vec<String>>> = HashMap::new();
	let mut processed = 0_u32;

	for index in 0..source.page_count() {
		let page_number = (index + 1) as i32;
		let page = match source.page(index) {
			Ok(page) => page,
			Err(err) => {
				tracing::warn!(page = page_number, %err, "page extraction failed; emitting empty page");

				pages.push(PageText {
					page: page_number,
					text: String::new(),
					char_count: 0,
					width: 0.0,
					height: 0.0,
					tables: Vec::new(),
				});

				continue;
			},
		};

		if !page.text.trim().is_empty() {
			processed += 1;
		}

		let mut page_table_ids = Vec::new();

		for (table_idx, rows) in page.tables.iter().enumerate() {
			let table_id = format!("table_{page_number:03}_{table_idx:02}");

			table_index.push(TableIndexEntry {
				table_id: table_id.clone(),
				page: page_number,
				rows: rows.len(),
				cols: rows.first().map(Vec::len).unwrap_or(0),
				file: format!("tables/{table_id}.json"),
			});
			table_bodies.insert(table_id.clone(), rows.clone());
			page_table_ids.push(table_id);
		}

		pages.push(PageText {
			page: page_number,
			char_count: page.text.chars().count(),
			text: page.text,
			width: page.width,
			height: page.height,
			tables: page_table_ids,
		});
	}

	let sections = detect_sections(&pages);
	let metadata = DocumentMetadata {
		document_id: request.document_id.clone(),
		company_name: request.company_name.clone(),
		product_name: request.product_name.clone(),
		doc_type: request.doc_type.clone(),
		version: request.version.clone(),
		effective_date: request.effective_date.clone(),
		source_file: request.source_file.clone(),
		file_size_bytes: request.file_size_bytes,
		total_pages: pages.len() as u32,
		processed_pages: processed,
		converted_at: OffsetDateTime::now_utc()
			.format(&Rfc3339)
			.unwrap_or_else(|_| String::new()),
		converter_version: CONVERTER_VERSION.to_string(),
	};
	let report = ConvertReport {
		total_pages: metadata.total_pages,
		processed_pages: metadata.processed_pages,
		tables: table_index.len(),
		sections: sections.len(),
	};

	fs::write(doc_dir.join("metadata.json"), serde_json::to_vec_pretty(&metadata)?)?;
	fs::write(
		doc_dir.join("text.json"),
		serde_json::to_vec_pretty(&TextArtifact { pages })?,
	)?;
	fs::write(
		doc_dir.join("sections.json"),
		serde_json::to_vec_pretty(&SectionsArtifact { sections })?,
	)?;
	fs::write(
		doc_dir.join("tables_index.json"),
		serde_json::to_vec_pretty(&TablesIndexArtifact { tables: table_index })?,
	)?;

	for (table_id, rows) in &table_bodies {
		fs::write(
			tables_dir.join(format!("{table_id}.json")),
			serde_json::to_vec(rows)?,
		)?;
	}

	Ok(report)
}

/// Page-granular section boundaries. A new section opens when a short
/// standalone line matches a known heading; it runs until the page
/// before the next heading.
fn detect_sections(pages: &[PageText]) -> Vec<Section> {
	let mut sections: Vec<Section> = Vec::new();

	for page in pages {
		for line in page.text.lines() {
			let Some((section_type, title)) = classify_heading(line) else {
				continue;
			};

			if let Some(open) = sections.last()
				&& open.section_type == section_type
			{
				continue;
			}
			if let Some(open) = sections.last_mut() {
				open.end_page = (page.page - 1).max(open.start_page);
			}

			sections.push(Section {
				section_type: section_type.to_string(),
				title,
				start_page: page.page,
				end_page: page.page,
				level: 1,
			});

			break;
		}
	}

	let last_page = pages.last().map(|page| page.page).unwrap_or(0);

	if let Some(open) = sections.last_mut() {
		open.end_page = last_page.max(open.start_page);
	}

	sections
}

fn classify_heading(line: &str) -> Option<(&'static str, Option<String>)> {
	let trimmed = line.trim();

	if trimmed.is_empty() || trimmed.chars().count() > MAX_HEADING_CHARS {
		return None;
	}

	SECTION_TYPES
		.iter()
		.find(|(_, pattern)| {
			Regex::new(pattern).map(|re| re.is_match(trimmed)).unwrap_or(false)
		})
		.map(|(name, _)| (*name, Some(trimmed.to_string())))
}

#[cfg(test)]
mod tests {
	use crate::{artifacts::ConvertedDocument, source::FixturePageSource};

	use super::*;

	fn request() -> ConvertRequest {
		ConvertRequest {
			document_id: "samsung_terms_001".to_string(),
			company_name: "삼성화재".to_string(),
			product_name: "무배당 건강보험".to_string(),
			doc_type: "terms".to_string(),
			version: "1.0".to_string(),
			effective_date: Some("2025-01-01".to_string()),
			source_file: "samsung_terms_001.pdf".to_string(),
			file_size_bytes: 2_048,
		}
	}

	#[test]
	fn writes_all_four_artifacts() {
		let out = tempfile::tempdir().expect("tempdir failed");
		let source = FixturePageSource::new(&[
			"보통약관\n제1조(목적) 이 약관은 보험계약의 내용을 정합니다.",
			"담보명  가입금액\n암진단비  3,000만원",
		]);
		let report = convert_document(&source, &request(), out.path()).expect("convert failed");

		assert_eq!(report.total_pages, 2);
		assert_eq!(report.processed_pages, 2);
		assert_eq!(report.tables, 1);

		let doc = ConvertedDocument::load(&out.path().join("삼성화재").join("samsung_terms_001"))
			.expect("load failed");

		assert_eq!(doc.metadata.converter_version, CONVERTER_VERSION);
		assert_eq!(doc.tables_index.tables[0].table_id, "table_002_00");
		assert_eq!(doc.text.pages[1].tables, vec!["table_002_00".to_string()]);

		let table = doc.table("table_002_00").expect("table read failed");

		assert_eq!(table[1], vec!["암진단비", "3,000만원"]);
	}

	#[test]
	fn sections_cover_page_ranges() {
		let pages = vec![
			PageText {
				page: 1,
				text: "보통약관\n본문".to_string(),
				char_count: 0,
				width: 595.0,
				height: 842.0,
				tables: Vec::new(),
			},
			PageText {
				page: 2,
				text: "본문 계속".to_string(),
				char_count: 0,
				width: 595.0,
				height: 842.0,
				tables: Vec::new(),
			},
			PageText {
				page: 3,
				text: "암진단 특별약관\n본문".to_string(),
				char_count: 0,
				width: 595.0,
				height: 842.0,
				tables: Vec::new(),
			},
		];
		let sections = detect_sections(&pages);

		assert_eq!(sections.len(), 2);
		assert_eq!(sections[0].section_type, "보통약관");
		assert_eq!((sections[0].start_page, sections[0].end_page), (1, 2));
		assert_eq!(sections[1].section_type, "특별약관");
		assert_eq!((sections[1].start_page, sections[1].end_page), (3, 3));
		assert_eq!(sections[1].title.as_deref(), Some("암진단 특별약관"));
	}

	#[test]
	fn long_lines_are_not_headings() {
		let line = "이 보통약관 조항은 계약자와 회사 사이의 권리와 의무를 정하며 별표의 내용을 포함하여 해석상 다툼이 있는 경우 적용됩니다";

		assert!(classify_heading(line).is_none());
	}
}
