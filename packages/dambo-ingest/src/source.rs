//! Page-level access to a source PDF, plus the whitespace-grid table
//! detector the converter runs on every page.

use std::{fs, path::Path};

use crate::{Error, Result};

/// Fallback page size (A4 in points) when the PDF carries no MediaBox.
const DEFAULT_PAGE_WIDTH: f64 = 595.0;
const DEFAULT_PAGE_HEIGHT: f64 = 842.0;

/// Minimum run of spaces separating two cells on one line.
const MIN_CELL_GAP: usize = 2;
/// Minimum consecutive multi-cell lines to call the block a table.
const MIN_TABLE_LINES: usize = 2;

#[derive(Clone, Debug)]
pub struct Page {
	pub text: String,
	pub width: f64,
	pub height: f64,
	pub tables: Vec<Vec<Vec<String>>>,
}

pub trait PageSource {
	fn page_count(&self) -> usize;
	fn page(&self, index: usize) -> Result<Page>;
}

/// Extracts text per page with pdf-extract and page dimensions with lopdf.
/// Pages that fail extraction come back empty rather than failing the
/// whole document.
#[derive(Debug)]
pub struct PdfPageSource {
	texts: Vec<String>,
	dims: Vec<(f64, f64)>,
}
impl PdfPageSource {
	pub fn open(path: &Path) -> Result<Self> {
		if !path.is_file() {
			return Err(Error::Pdf(format!("no such file: {}", path.display())));
		}

		let data = fs::read(path)?;

		Self::from_bytes(&data)
	}

	pub fn from_bytes(data: &[u8]) -> Result<Self> {
		let texts = pdf_extract::extract_text_from_mem_by_pages(data)
			.map_err(|err| Error::Pdf(err.to_string()))?;
		let dims = page_dimensions(data, texts.len());

		Ok(Self { texts, dims })
	}
}
impl PageSource for PdfPageSource {
	fn page_count(&self) -> usize {
		self.texts.len()
	}

	fn page(&self, index: usize) -> Result<Page> {
		let text = self.texts.get(index).cloned().ok_or_else(|| {
			Error::Pdf(format!("page {index} out of range ({} pages)", self.texts.len()))
		})?;
		let (width, height) =
			self.dims.get(index).copied().unwrap_or((DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT));
		let tables = detect_table_grids(&text);

		Ok(Page { text, width, height, tables })
	}
}

fn page_dimensions(data: &[u8], page_count: usize) -> Vec<(f64, f64)> {
	let mut dims = vec![(DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT); page_count];
	let Ok(doc) = lopdf::Document::load_mem(data) else {
		tracing::warn!("could not reopen PDF for page dimensions; using defaults");

		return dims;
	};

	for (index, (_, object_id)) in doc.get_pages().into_iter().enumerate() {
		if index >= dims.len() {
			break;
		}
		if let Some(rect) = media_box(&doc, object_id) {
			dims[index] = rect;
		}
	}

	dims
}

fn media_box(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> Option<(f64, f64)> {
	let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
	let rect = page.get(b"MediaBox").ok()?.as_array().ok()?;
	if rect.len() != 4 {
		return None;
	}

	let coords: Vec<f64> = rect.iter().filter_map(|value| as_number(value)).collect();
	if coords.len() != 4 {
		return None;
	}

	Some(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
}

fn as_number(object: &lopdf::Object) -> Option<f64> {
	match object {
		lopdf::Object::Integer(n) => Some(*n as f64),
		lopdf::Object::Real(n) => Some(*n as f64),
		_ => None,
	}
}

/// In-memory source for tests and fixture-driven conversion.
pub struct FixturePageSource {
	pages: Vec<Page>,
}
impl FixturePageSource {
	pub fn new(texts: &[&str]) -> Self {
		let pages = texts
			.iter()
			.map(|text| Page {
				text: text.to_string(),
				width: DEFAULT_PAGE_WIDTH,
				height: DEFAULT_PAGE_HEIGHT,
				tables: detect_table_grids(text),
			})
			.collect();

		Self { pages }
	}
}
impl PageSource for FixturePageSource {
	fn page_count(&self) -> usize {
		self.pages.len()
	}

	fn page(&self, index: usize) -> Result<Page> {
		self.pages
			.get(index)
			.cloned()
			.ok_or_else(|| Error::Pdf(format!("fixture page {index} out of range")))
	}
}

/// Finds table-like grids in extracted page text. A grid is a run of at
/// least [`MIN_TABLE_LINES`] consecutive lines that each split into two
/// or more cells at whitespace gutters. Rows are padded to the widest
/// row, cell whitespace is collapsed, and blank rows are dropped.
pub fn detect_table_grids(text: &str) -> Vec<Vec<Vec<String>>> {
	let mut grids = Vec::new();
	let mut current: Vec<Vec<String>> = Vec::new();

	for line in text.lines() {
		let cells = split_cells(line);

		if cells.len() >= 2 {
			current.push(cells);
		} else {
			flush_grid(&mut current, &mut grids);
		}
	}

	flush_grid(&mut current, &mut grids);

	grids
}

fn flush_grid(current: &mut Vec<Vec<String>>, grids: &mut Vec<Vec<Vec<String>>>) {
	if current.len() >= MIN_TABLE_LINES {
		let cols = current.iter().map(Vec::len).max().unwrap_or(0);
		let rows: Vec<Vec<String>> = current
			.drain(..)
			.map(|mut row| {
				row.resize(cols, String::new());

				row
			})
			.filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
			.collect();

		if !rows.is_empty() {
			grids.push(rows);
		}
	} else {
		current.clear();
	}
}

fn split_cells(line: &str) -> Vec<String> {
	let mut cells = Vec::new();
	let mut cell = String::new();
	let mut gap = 0;

	for ch in line.chars() {
		if ch == '\t' {
			push_cell(&mut cells, &mut cell);
			gap = 0;
		} else if ch == ' ' {
			gap += 1;

			if gap >= MIN_CELL_GAP {
				push_cell(&mut cells, &mut cell);
			} else {
				cell.push(ch);
			}
		} else {
			gap = 0;

			cell.push(ch);
		}
	}

	push_cell(&mut cells, &mut cell);

	cells
}

fn push_cell(cells: &mut Vec<String>, cell: &mut String) {
	let collapsed = cell.split_whitespace().collect::<Vec<_>>().join(" ");

	cell.clear();

	if !collapsed.is_empty() {
		cells.push(collapsed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn grid_detected_from_aligned_columns() {
		let text = "\
보험료 납입 안내문

담보명            가입금액      보험료
암진단비          3,000만원     12,000원
뇌출혈진단비      1,000만원     3,500원

위 내용을 확인하시기 바랍니다.";
		let grids = detect_table_grids(text);

		assert_eq!(grids.len(), 1);
		assert_eq!(grids[0].len(), 3);
		assert_eq!(grids[0][1], vec!["암진단비", "3,000만원", "12,000원"]);
	}

	#[test]
	fn short_runs_are_not_tables() {
		let text = "왼쪽  오른쪽\n평범한 문장 한 줄입니다";

		assert!(detect_table_grids(text).is_empty());
	}

	#[test]
	fn ragged_rows_are_padded() {
		let text = "이름  금액  기간\n암진단비  3천만원";
		let grids = detect_table_grids(text);

		assert_eq!(grids[0][1], vec!["암진단비", "3천만원", ""]);
	}

	#[test]
	fn missing_pdf_is_a_hard_error() {
		let err = PdfPageSource::open(Path::new("/nonexistent/file.pdf"))
			.expect_err("Expected an error.");

		assert!(err.to_string().contains("no such file"));
	}

	#[test]
	fn garbage_bytes_are_rejected() {
		assert!(PdfPageSource::from_bytes(b"not a pdf").is_err());
	}

	#[test]
	fn fixture_source_serves_pages_in_order() {
		let source = FixturePageSource::new(&["첫 페이지", "둘째 페이지"]);

		assert_eq!(source.page_count(), 2);
		assert_eq!(source.page(1).expect("page read failed").text, "둘째 페이지");
		assert!(source.page(2).is_err());
	}
}
