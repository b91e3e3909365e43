//! Canned converted-document trees for parser and ingest tests.

use std::{fs, path::PathBuf};

use serde_json::json;
use tempfile::TempDir;

use crate::Result;

pub struct ConvertedPage {
	pub page: i32,
	pub text: String,
}

pub struct ConvertedTable {
	pub page: i32,
	pub rows: Vec<Vec<String>>,
}

pub struct ConvertedDocSpec {
	pub company_name: String,
	pub document_id: String,
	pub product_name: String,
	pub doc_type: String,
	pub pages: Vec<ConvertedPage>,
	pub tables: Vec<ConvertedTable>,
}

pub fn page(page: i32, text: &str) -> ConvertedPage {
	ConvertedPage { page, text: text.to_string() }
}

pub fn table(page: i32, rows: &[&[&str]]) -> ConvertedTable {
	ConvertedTable {
		page,
		rows: rows.iter().map(|row| row.iter().map(|cell| cell.to_string()).collect()).collect(),
	}
}

/// Writes the on-disk artifact layout for one converted document under a
/// fresh temp directory and returns the directory holding it.
pub fn write_converted_document(spec: &ConvertedDocSpec) -> Result<(TempDir, PathBuf)> {
	let root = TempDir::new()?;
	let doc_dir = root.path().join(&spec.company_name).join(&spec.document_id);
	let tables_dir = doc_dir.join("tables");

	fs::create_dir_all(&tables_dir)?;

	let metadata = json!({
		"document_id": spec.document_id,
		"company_name": spec.company_name,
		"product_name": spec.product_name,
		"doc_type": spec.doc_type,
		"version": "1.0",
		"effective_date": "2025-01-01",
		"source_file": format!("{}.pdf", spec.document_id),
		"file_size_bytes": 1024,
		"total_pages": spec.pages.len(),
		"processed_pages": spec.pages.len(),
		"converted_at": "2025-01-01T00:00:00Z",
		"converter_version": "2.0.0",
	});

	fs::write(doc_dir.join("metadata.json"), serde_json::to_vec_pretty(&metadata)?)?;

	let mut page_tables: Vec<Vec<String>> = spec.pages.iter().map(|_| Vec::new()).collect();
	let mut table_index = Vec::new();

	for (idx, table) in spec.tables.iter().enumerate() {
		let table_id = format!("table_{:03}_{:02}", table.page, idx);
		let file = format!("tables/{table_id}.json");

		fs::write(tables_dir.join(format!("{table_id}.json")), serde_json::to_vec(&table.rows)?)?;
		table_index.push(json!({
			"table_id": table_id,
			"page": table.page,
			"rows": table.rows.len(),
			"cols": table.rows.first().map(|row| row.len()).unwrap_or(0),
			"file": file,
		}));

		if let Some(slot) = page_tables.get_mut((table.page - 1) as usize) {
			slot.push(table_id);
		}
	}

	let pages: Vec<_> = spec
		.pages
		.iter()
		.zip(page_tables)
		.map(|(page, tables)| {
			json!({
				"page": page.page,
				"text": page.text,
				"char_count": page.text.chars().count(),
				"width": 595.0,
				"height": 842.0,
				"tables": tables,
			})
		})
		.collect();

	fs::write(doc_dir.join("text.json"), serde_json::to_vec_pretty(&json!({ "pages": pages }))?)?;
	fs::write(doc_dir.join("sections.json"), serde_json::to_vec_pretty(&json!({ "sections": [] }))?)?;
	fs::write(
		doc_dir.join("tables_index.json"),
		serde_json::to_vec_pretty(&json!({ "tables": table_index }))?,
	)?;

	Ok((root, doc_dir))
}
