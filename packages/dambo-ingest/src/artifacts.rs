//! On-disk layout of a converted document and the ingestion metadata file.

use std::{
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DocumentMetadata {
	pub document_id: String,
	pub company_name: String,
	pub product_name: String,
	pub doc_type: String,
	pub version: String,
	pub effective_date: Option<String>,
	pub source_file: String,
	pub file_size_bytes: u64,
	pub total_pages: u32,
	pub processed_pages: u32,
	pub converted_at: String,
	pub converter_version: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PageText {
	pub page: i32,
	pub text: String,
	pub char_count: usize,
	pub width: f64,
	pub height: f64,
	pub tables: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TextArtifact {
	pub pages: Vec<PageText>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Section {
	#[serde(rename = "type")]
	pub section_type: String,
	pub title: Option<String>,
	pub start_page: i32,
	pub end_page: i32,
	pub level: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SectionsArtifact {
	pub sections: Vec<Section>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TableIndexEntry {
	pub table_id: String,
	pub page: i32,
	pub rows: usize,
	pub cols: usize,
	pub file: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TablesIndexArtifact {
	pub tables: Vec<TableIndexEntry>,
}

/// A converted document loaded back from its artifact directory. Table
/// bodies stay on disk until [`Self::table`] asks for one.
#[derive(Debug)]
pub struct ConvertedDocument {
	pub dir: PathBuf,
	pub metadata: DocumentMetadata,
	pub text: TextArtifact,
	pub sections: SectionsArtifact,
	pub tables_index: TablesIndexArtifact,
}
impl ConvertedDocument {
	pub fn load(dir: &Path) -> Result<Self> {
		Ok(Self {
			dir: dir.to_path_buf(),
			metadata: read_json(&dir.join("metadata.json"))?,
			text: read_json(&dir.join("text.json"))?,
			sections: read_json(&dir.join("sections.json"))?,
			tables_index: read_json(&dir.join("tables_index.json"))?,
		})
	}

	pub fn table(&self, table_id: &str) -> Result<Vec<Vec<String>>> {
		read_json(&self.dir.join("tables").join(format!("{table_id}.json")))
	}

	/// Section type covering the given page, if any section claims it.
	pub fn section_type_for_page(&self, page: i32) -> Option<&str> {
		self.sections
			.sections
			.iter()
			.find(|section| section.start_page <= page && page <= section.end_page)
			.map(|section| section.section_type.as_str())
	}
}

fn read_json<T>(path: &Path) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	if !path.is_file() {
		return Err(Error::MissingArtifact { path: path.to_path_buf() });
	}

	let raw = fs::read(path)?;

	Ok(serde_json::from_slice(&raw)?)
}

/// One entry of the ingestion metadata array, describing a document the
/// batch driver should pick up.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IngestRecord {
	pub document_id: String,
	pub company_code: String,
	pub company_name: String,
	pub product_code: String,
	pub product_name: String,
	pub version: String,
	pub effective_date: Option<String>,
	pub doc_type: String,
	pub doc_subtype: Option<String>,
	pub file_path: String,
	pub attributes: Option<Value>,
}
impl IngestRecord {
	pub fn target_gender(&self) -> Option<&str> {
		self.attributes.as_ref()?.get("target_gender")?.as_str()
	}

	pub fn target_age_range(&self) -> Option<&str> {
		self.attributes.as_ref()?.get("target_age_range")?.as_str()
	}
}

pub fn load_ingest_records(path: &Path) -> Result<Vec<IngestRecord>> {
	if !path.is_file() {
		return Err(Error::MissingArtifact { path: path.to_path_buf() });
	}

	let raw = fs::read(path)?;

	Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
mod tests {
	use dambo_testkit::fixtures::{self, ConvertedDocSpec};

	use super::*;

	fn spec() -> ConvertedDocSpec {
		ConvertedDocSpec {
			company_name: "삼성화재".to_string(),
			document_id: "samsung_terms_001".to_string(),
			product_name: "무배당 건강보험".to_string(),
			doc_type: "terms".to_string(),
			pages: vec![fixtures::page(1, "제1조(보험금의 지급사유) 회사는 보험금을 지급합니다.")],
			tables: vec![fixtures::table(1, &[&["담보명", "가입금액"], &["암진단비", "3,000만원"]])],
		}
	}

	#[test]
	fn loads_converted_document_tree() {
		let (_root, dir) = fixtures::write_converted_document(&spec()).expect("fixture failed");
		let doc = ConvertedDocument::load(&dir).expect("load failed");

		assert_eq!(doc.metadata.document_id, "samsung_terms_001");
		assert_eq!(doc.metadata.converter_version, "2.0.0");
		assert_eq!(doc.text.pages.len(), 1);
		assert_eq!(doc.text.pages[0].tables, vec!["table_001_00".to_string()]);

		let table = doc.table("table_001_00").expect("table read failed");

		assert_eq!(table[1][0], "암진단비");
	}

	#[test]
	fn missing_artifact_is_reported_with_path() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let err = ConvertedDocument::load(dir.path()).expect_err("Expected an error.");

		assert!(err.to_string().contains("metadata.json"));
	}

	#[test]
	fn record_attributes_expose_gender_and_age() {
		let record = IngestRecord {
			document_id: "doc".to_string(),
			company_code: "samsung".to_string(),
			company_name: "삼성화재".to_string(),
			product_code: "P001".to_string(),
			product_name: "건강보험".to_string(),
			version: "1.0".to_string(),
			effective_date: None,
			doc_type: "proposal".to_string(),
			doc_subtype: None,
			file_path: "a.pdf".to_string(),
			attributes: Some(serde_json::json!({
				"target_gender": "male",
				"target_age_range": "≤40",
			})),
		};

		assert_eq!(record.target_gender(), Some("male"));
		assert_eq!(record.target_age_range(), Some("≤40"));
	}
}
