//! Article splitter for terms documents. Splits section text on 제N조
//! markers (including 제N조의M) and derives titles from the first line.

use dambo_storage::models::NewClause;
use regex::Regex;

use crate::artifacts::ConvertedDocument;

const ARTICLE_MARKER: &str = r"제\s*\d+\s*조(?:의\s*\d+)?";

/// Longest first line still treated as a title rather than body text.
const MAX_TITLE_CHARS: usize = 100;

#[derive(Clone, Debug)]
pub struct SectionBlock {
	pub text: String,
	pub page: Option<i32>,
	pub section_type: Option<String>,
}

/// Groups consecutive pages sharing a section type into blocks the
/// article splitter can run over. Pages outside any section form their
/// own untyped blocks.
pub fn section_blocks(doc: &ConvertedDocument) -> Vec<SectionBlock> {
	let mut blocks: Vec<SectionBlock> = Vec::new();

	for page in &doc.text.pages {
		let section_type = doc.section_type_for_page(page.page).map(str::to_string);

		match blocks.last_mut() {
			Some(block) if block.section_type == section_type => {
				block.text.push('\n');
				block.text.push_str(&page.text);
			},
			_ => blocks.push(SectionBlock {
				text: page.text.clone(),
				page: Some(page.page),
				section_type,
			}),
		}
	}

	blocks
}

pub fn parse(blocks: &[SectionBlock]) -> Vec<NewClause> {
	let mut clauses = Vec::new();

	for block in blocks {
		clauses.extend(extract_articles(
			&block.text,
			block.page,
			block.section_type.as_deref(),
		));
	}

	clauses
}

/// Splits text at article markers. Text before the first marker is
/// dropped; each marker opens a clause running to the next marker.
fn extract_articles(text: &str, page: Option<i32>, section_type: Option<&str>) -> Vec<NewClause> {
	let Ok(re) = Regex::new(ARTICLE_MARKER) else { return Vec::new() };
	let markers: Vec<_> = re.find_iter(text).collect();
	let mut clauses = Vec::new();

	for (idx, marker) in markers.iter().enumerate() {
		let body_end = markers.get(idx + 1).map(|next| next.start()).unwrap_or(text.len());
		let body = &text[marker.end()..body_end];
		let number = marker.as_str().split_whitespace().collect::<String>();

		clauses.push(article_chunk(&number, body, page, section_type));
	}

	clauses
}

fn article_chunk(
	clause_number: &str,
	body: &str,
	page: Option<i32>,
	section_type: Option<&str>,
) -> NewClause {
	let body = body.trim();
	let lines: Vec<&str> = body.lines().collect();
	let mut title = None;
	let mut clause_text = body.to_string();

	if let Some(first_line) = lines.first().map(|line| line.trim())
		&& !first_line.is_empty()
		&& first_line.chars().count() < MAX_TITLE_CHARS
	{
		if let Some(inner) = between(first_line, '(', ')') {
			title = Some(inner);
		} else if let Some(inner) = between(first_line, '[', ']') {
			title = Some(inner);
		} else {
			title = Some(first_line.to_string());
			clause_text = lines[1..].join("\n").trim().to_string();
		}
	}
	if clause_text.is_empty() {
		clause_text = title
			.clone()
			.filter(|t| !t.is_empty())
			.unwrap_or_else(|| clause_number.to_string());
	}
	if clause_text.is_empty() {
		clause_text = "(내용 없음)".to_string();
	}

	NewClause {
		clause_type: "article".to_string(),
		clause_number: Some(clause_number.to_string()),
		clause_title: title,
		clause_text,
		structured_data: None,
		section_type: section_type.map(str::to_string),
		page_number: page,
		hierarchy_level: 0,
	}
}

fn between(text: &str, open: char, close: char) -> Option<String> {
	let start = text.find(open)?;
	let end = text.find(close)?;
	if end <= start {
		return None;
	}

	Some(text[start + open.len_utf8()..end].to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_articles_and_extracts_paren_titles() {
		let text = "\
무배당 건강보험 보통약관

제1조(보험금의 지급사유) 회사는 피보험자에게 다음의 사유가 발생한 경우 보험금을 지급합니다.
1. 암으로 진단 확정된 경우

제2조(보험금 지급에 관한 세부규정) 제1조의 보험금은 청구일부터 3영업일 이내에 지급합니다.";
		let clauses = extract_articles(text, Some(1), Some("보통약관"));

		assert_eq!(clauses.len(), 2);
		assert_eq!(clauses[0].clause_number.as_deref(), Some("제1조"));
		assert_eq!(clauses[0].clause_title.as_deref(), Some("보험금의 지급사유"));
		assert!(clauses[0].clause_text.contains("암으로 진단 확정된 경우"));
		assert_eq!(clauses[1].clause_number.as_deref(), Some("제2조"));
		assert_eq!(clauses[1].section_type.as_deref(), Some("보통약관"));
	}

	#[test]
	fn sub_article_numbers_are_kept() {
		let text = "제3조의2(특별한 경우) 본문입니다.";
		let clauses = extract_articles(text, None, None);

		assert_eq!(clauses[0].clause_number.as_deref(), Some("제3조의2"));
	}

	#[test]
	fn paren_title_keeps_the_whole_body() {
		let clause = article_chunk("제1조", "(목적) 이 약관의 목적입니다.", None, None);

		assert_eq!(clause.clause_title.as_deref(), Some("목적"));
		assert!(clause.clause_text.contains("(목적)"));
	}

	#[test]
	fn bare_first_line_becomes_title_and_leaves_the_rest() {
		let clause = article_chunk("제5조", "계약의 성립\n계약은 청약과 승낙으로 성립합니다.", None, None);

		assert_eq!(clause.clause_title.as_deref(), Some("계약의 성립"));
		assert_eq!(clause.clause_text, "계약은 청약과 승낙으로 성립합니다.");
	}

	#[test]
	fn empty_body_falls_back_to_title_then_number() {
		let titled = article_chunk("제7조", "해지권\n", None, None);

		assert_eq!(titled.clause_text, "해지권");

		let bare = article_chunk("제8조", "", None, None);

		assert_eq!(bare.clause_text, "제8조");
	}

	#[test]
	fn preamble_before_the_first_marker_is_dropped() {
		let clauses = extract_articles("서문만 있는 텍스트입니다.", None, None);

		assert!(clauses.is_empty());
	}
}
