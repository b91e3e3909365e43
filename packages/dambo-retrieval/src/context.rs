//! Context assembler: deduplicates and reweights ranked hits, enriches
//! them with linked coverage and benefit rows, and renders a bounded
//! context text with citations.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;

use dambo_storage::{models::LinkedCoverage, search};

use crate::{Result, retriever::ScoredHit};

/// Document types ranked by how directly they answer benefit questions.
const DOC_TYPE_WEIGHTS: &[(&str, f64)] =
	&[("proposal", 1.20), ("product_summary", 1.15), ("business_spec", 1.10), ("terms", 1.00)];

#[derive(Debug, Serialize)]
pub struct CoverageContext {
	pub coverage_name: String,
	pub coverage_category: String,
	pub amount_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClauseContext {
	pub clause_id: i64,
	pub clause_number: Option<String>,
	pub clause_title: Option<String>,
	pub clause_text: String,
	pub doc_type: String,
	pub company_name: String,
	pub product_name: String,
	pub page_number: Option<i32>,
	pub similarity: f64,
	pub weighted_score: f64,
	pub coverages: Vec<CoverageContext>,
}

#[derive(Debug, Serialize)]
pub struct Citation {
	pub index: usize,
	pub clause_number: Option<String>,
	pub clause_title: Option<String>,
	pub doc_type: String,
	pub company_name: String,
	pub page_number: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ContextMetadata {
	pub products: Vec<String>,
	pub companies: Vec<String>,
	pub doc_types: Vec<String>,
	pub num_clauses: usize,
	pub avg_similarity: f64,
}

#[derive(Debug, Serialize)]
pub struct AssembledContext {
	pub query: String,
	pub context_text: String,
	pub clauses: Vec<ClauseContext>,
	pub citations: Vec<Citation>,
	pub metadata: ContextMetadata,
}

pub async fn assemble(
	pool: &PgPool,
	query: &str,
	hits: Vec<ScoredHit>,
	max_context_length: usize,
) -> Result<AssembledContext> {
	let mut clauses = Vec::new();
	let mut seen = HashSet::new();

	for scored in hits {
		if !seen.insert(scored.hit.clause_id) {
			continue;
		}

		let coverages = search::linked_coverages(pool, scored.hit.clause_id).await?;

		clauses.push(clause_context(scored, coverages));
	}

	clauses.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));

	Ok(render(query, clauses, max_context_length))
}

pub fn doc_type_weight(doc_type: &str) -> f64 {
	DOC_TYPE_WEIGHTS
		.iter()
		.find(|(name, _)| *name == doc_type)
		.map(|(_, weight)| *weight)
		.unwrap_or(1.0)
}

fn clause_context(scored: ScoredHit, linked: Vec<LinkedCoverage>) -> ClauseContext {
	let hit = scored.hit;
	let mut coverages: Vec<CoverageContext> = Vec::new();

	for row in linked {
		// Benefit rows fan the join out; keep one entry per coverage, the
		// first amounted benefit winning.
		let amount_text = render_benefit_amount(row.benefit_amount, row.benefit_amount_text);

		match coverages.iter_mut().find(|entry| entry.coverage_name == row.coverage_name) {
			Some(entry) =>
				if entry.amount_text.is_none() {
					entry.amount_text = amount_text;
				},
			None => coverages.push(CoverageContext {
				coverage_name: row.coverage_name,
				coverage_category: row.coverage_category,
				amount_text,
			}),
		}
	}

	ClauseContext {
		weighted_score: scored.score * doc_type_weight(&hit.doc_type),
		clause_id: hit.clause_id,
		clause_number: hit.clause_number,
		clause_title: hit.clause_title,
		clause_text: hit.clause_text,
		doc_type: hit.doc_type,
		company_name: hit.company_name,
		product_name: hit.product_name,
		page_number: hit.page_number,
		similarity: hit.similarity,
		coverages,
	}
}

/// Numeric amounts render as comma-grouped 만원 with the spoken form in
/// parentheses; otherwise the stored text passes through.
fn render_benefit_amount(amount: Option<i64>, text: Option<String>) -> Option<String> {
	if let Some(won) = amount
		&& won >= 10_000
	{
		return Some(format!(
			"{}만원 ({})",
			format_thousands(won / 10_000),
			render_amount_spoken(won)
		));
	}

	text
}

fn render_amount_spoken(won: i64) -> String {
	let mut parts = Vec::new();
	let eok = won / 100_000_000;
	let cheonman = won % 100_000_000 / 10_000_000;
	let man = won % 10_000_000 / 10_000;

	if eok > 0 {
		parts.push(format!("{eok}억"));
	}
	if cheonman > 0 {
		parts.push(format!("{cheonman}천만"));
	}
	if man > 0 {
		parts.push(format!("{man}만"));
	}
	if parts.is_empty() {
		return format!("{won}원");
	}

	format!("{}원", parts.concat())
}

fn format_thousands(value: i64) -> String {
	let digits = value.to_string();
	let mut grouped = String::new();

	for (index, ch) in digits.chars().enumerate() {
		if index > 0 && (digits.len() - index) % 3 == 0 {
			grouped.push(',');
		}

		grouped.push(ch);
	}

	grouped
}

fn render(query: &str, clauses: Vec<ClauseContext>, budget: usize) -> AssembledContext {
	let mut context_text = String::new();
	let mut citations = Vec::new();
	let mut included = Vec::new();

	for clause in clauses {
		let index = included.len() + 1;
		let block = render_block(index, &clause);

		// A block that would overflow the budget is dropped whole.
		if context_text.chars().count() + block.chars().count() > budget {
			break;
		}

		context_text.push_str(&block);
		citations.push(Citation {
			index,
			clause_number: clause.clause_number.clone(),
			clause_title: clause.clause_title.clone(),
			doc_type: clause.doc_type.clone(),
			company_name: clause.company_name.clone(),
			page_number: clause.page_number,
		});
		included.push(clause);
	}

	let metadata = metadata(&included);

	AssembledContext { query: query.to_string(), context_text, clauses: included, citations, metadata }
}

fn render_block(index: usize, clause: &ClauseContext) -> String {
	let mut header = format!("[{index}]");

	if let Some(number) = &clause.clause_number {
		header.push(' ');
		header.push_str(number);
	}
	if let Some(title) = &clause.clause_title {
		header.push(' ');
		header.push_str(title);
	}

	header.push_str(&format!(" ({}, {}", clause.doc_type, clause.company_name));

	if let Some(page) = clause.page_number {
		header.push_str(&format!(", p.{page}"));
	}

	header.push(')');

	let mut block = format!("{header}\n{}\n", clause.clause_text);

	if !clause.coverages.is_empty() {
		block.push_str("보장 정보:\n");

		for coverage in &clause.coverages {
			match &coverage.amount_text {
				Some(amount) =>
					block.push_str(&format!("- {}: {amount}\n", coverage.coverage_name)),
				None => block.push_str(&format!("- {}\n", coverage.coverage_name)),
			}
		}
	}

	block.push('\n');

	block
}

fn metadata(clauses: &[ClauseContext]) -> ContextMetadata {
	let mut products = Vec::new();
	let mut companies = Vec::new();
	let mut doc_types = Vec::new();

	for clause in clauses {
		if !products.contains(&clause.product_name) {
			products.push(clause.product_name.clone());
		}
		if !companies.contains(&clause.company_name) {
			companies.push(clause.company_name.clone());
		}
		if !doc_types.contains(&clause.doc_type) {
			doc_types.push(clause.doc_type.clone());
		}
	}

	let avg_similarity = if clauses.is_empty() {
		0.0
	} else {
		clauses.iter().map(|clause| clause.similarity).sum::<f64>() / clauses.len() as f64
	};

	ContextMetadata {
		products,
		companies,
		doc_types,
		num_clauses: clauses.len(),
		avg_similarity,
	}
}
