//! Three-tier clause-to-coverage linker: exact name match, fuzzy match,
//! then an optional LLM pass over the stubborn remainder. Each tier only
//! sees clauses the earlier tiers left unmapped, and re-running any tier
//! is a no-op thanks to the unique `(clause_id, coverage_id)` key.

use std::collections::HashMap;

use regex::Regex;
use sqlx::PgPool;
use unicode_normalization::UnicodeNormalization;

use dambo_domain::fuzzy::partial_ratio;
use dambo_storage::{
	documents,
	models::{Coverage, MappingStat},
	ontology::{self, ClauseCoverageInsert},
};

use crate::{Error, Result};

/// Clauses worth showing to the LLM tier contain at least one of these.
const LLM_FILTER_KEYWORDS: &[&str] =
	&["보험금", "담보", "보장", "진단", "수술", "입원", "치료"];

/// Characters of clause text the fuzzy tier compares against coverage
/// names.
const FUZZY_TEXT_PREFIX: usize = 200;

#[derive(Debug, Default)]
pub struct LinkReport {
	pub exact: u64,
	pub fuzzy: u64,
	pub llm: u64,
}

pub async fn link_all(
	pool: &PgPool,
	linker: &dambo_config::Linker,
	llm: &dambo_config::Llm,
) -> Result<LinkReport> {
	let mut report = LinkReport {
		exact: link_exact(pool).await?,
		fuzzy: link_fuzzy(pool, linker.fuzzy_threshold).await?,
		..Default::default()
	};

	if llm.enabled {
		report.llm =
			link_llm(pool, llm, linker.llm_confidence_floor, linker.llm_batch_limit).await?;
	}

	Ok(report)
}

/// Tier 1: NFC-normalized equality between a table row's structured
/// coverage name and a coverage of the same product.
pub async fn link_exact(pool: &PgPool) -> Result<u64> {
	let rows = documents::list_coverage_bearing_rows(pool).await?;
	let mut coverages_by_product: HashMap<i64, Vec<Coverage>> = HashMap::new();
	let mut inserts = Vec::new();

	for row in rows {
		let Some(raw_name) = row.structured_data.get("coverage_name").and_then(|v| v.as_str())
		else {
			continue;
		};
		let coverages = match coverages_by_product.entry(row.product_id) {
			std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
			std::collections::hash_map::Entry::Vacant(entry) => {
				entry.insert(ontology::list_product_coverages(pool, row.product_id).await?)
			},
		};
		let normalized: String = raw_name.nfc().collect();

		if let Some(coverage) =
			coverages.iter().find(|c| c.coverage_name.nfc().collect::<String>() == normalized)
		{
			inserts.push(ClauseCoverageInsert {
				clause_id: row.clause_id,
				coverage_id: coverage.id,
				relevance_score: 1.0,
			});
		}
	}

	if inserts.is_empty() {
		return Ok(0);
	}

	let candidates = inserts.len();
	let inserted = ontology::insert_clause_coverages(pool, inserts, "exact_match").await?;

	tracing::info!(candidates, inserted, "exact-match tier finished");

	Ok(inserted)
}

/// Tier 2: best partial-ratio between the clause's title plus leading
/// text and the product's coverage names.
pub async fn link_fuzzy(pool: &PgPool, threshold: u32) -> Result<u64> {
	let clauses = documents::list_unmapped_clauses(pool, &["table_row", "article", "text_block"])
		.await?;
	let mut coverages_by_product: HashMap<i64, Vec<Coverage>> = HashMap::new();
	let mut inserted = 0;

	for clause in clauses {
		let coverages = match coverages_by_product.entry(clause.product_id) {
			std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
			std::collections::hash_map::Entry::Vacant(entry) => {
				entry.insert(ontology::list_product_coverages(pool, clause.product_id).await?)
			},
		};
		let haystack = fuzzy_haystack(clause.clause_title.as_deref(), &clause.clause_text);
		let best = coverages
			.iter()
			.map(|coverage| (partial_ratio(&coverage.coverage_name, &haystack), coverage))
			.max_by_key(|(score, _)| *score);

		if let Some((score, coverage)) = best
			&& score as u32 >= threshold
		{
			let linked = ontology::insert_clause_coverage(
				pool,
				clause.clause_id,
				coverage.id,
				score as f32 / 100.0,
				"fuzzy_match",
			)
			.await?;

			if linked {
				inserted += 1;
			}
		}
	}

	tracing::info!(inserted, threshold, "fuzzy tier finished");

	Ok(inserted)
}

fn fuzzy_haystack(title: Option<&str>, text: &str) -> String {
	let prefix: String = text.chars().take(FUZZY_TEXT_PREFIX).collect();

	match title {
		Some(title) if !title.is_empty() => format!("{title} {prefix}"),
		_ => prefix,
	}
}

/// Tier 3: ask the LLM to pick a coverage from a numbered list. Every
/// accepted mapping is committed on its own so a mid-batch failure
/// keeps earlier answers.
pub async fn link_llm(
	pool: &PgPool,
	llm: &dambo_config::Llm,
	confidence_floor: f32,
	batch_limit: u32,
) -> Result<u64> {
	let clauses = documents::list_unmapped_clauses(pool, &["table_row", "article", "text_block"])
		.await?;
	let mut coverages_by_product: HashMap<i64, Vec<Coverage>> = HashMap::new();
	let mut inserted = 0;
	let mut asked = 0;

	for clause in clauses {
		if asked >= batch_limit {
			break;
		}
		if !LLM_FILTER_KEYWORDS.iter().any(|keyword| {
			clause.clause_text.contains(keyword)
				|| clause.clause_title.as_deref().is_some_and(|t| t.contains(keyword))
		}) {
			continue;
		}

		let coverages = match coverages_by_product.entry(clause.product_id) {
			std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
			std::collections::hash_map::Entry::Vacant(entry) => {
				entry.insert(ontology::list_product_coverages(pool, clause.product_id).await?)
			},
		};

		if coverages.is_empty() {
			continue;
		}

		asked += 1;

		let prompt = build_llm_prompt(
			clause.clause_title.as_deref(),
			&clause.clause_text,
			coverages,
		);
		let reply = match dambo_providers::llm::generate(llm, &prompt, Some(LLM_SYSTEM)).await {
			Ok(reply) => reply,
			Err(err) => {
				tracing::warn!(clause_id = clause.clause_id, %err, "LLM call failed; skipping clause");

				continue;
			},
		};
		let Some((answer, confidence)) = parse_llm_reply(&reply) else { continue };

		if confidence < confidence_floor {
			continue;
		}
		let Some(coverage) = answer.and_then(|n| coverages.get(n.checked_sub(1)?)) else {
			continue;
		};
		let linked = ontology::insert_clause_coverage(
			pool,
			clause.clause_id,
			coverage.id,
			confidence,
			"llm",
		)
		.await?;

		if linked {
			inserted += 1;
		}
	}

	tracing::info!(inserted, asked, "LLM tier finished");

	Ok(inserted)
}

const LLM_SYSTEM: &str = "\
당신은 보험 약관 분석 전문가입니다. 조항이 어느 담보에 대한 내용인지 판단하세요. \
반드시 지시된 형식으로만 답하세요.";

fn build_llm_prompt(title: Option<&str>, text: &str, coverages: &[Coverage]) -> String {
	let listing: String = coverages
		.iter()
		.enumerate()
		.map(|(index, coverage)| format!("{}. {}\n", index + 1, coverage.coverage_name))
		.collect();
	let excerpt: String = text.chars().take(500).collect();

	format!(
		"다음 조항이 아래 담보 목록 중 어느 담보에 해당하는지 고르세요.\n\n\
조항 제목: {}\n조항 내용: {excerpt}\n\n담보 목록:\n{listing}\n\
해당하는 담보가 없으면 NONE이라고 답하세요.\n\
형식:\nANSWER: <번호 또는 NONE>\nCONFIDENCE: <0과 1 사이의 숫자>",
		title.unwrap_or("(없음)")
	)
}

/// Parses the fixed `ANSWER:` / `CONFIDENCE:` reply shape. `Ok(None)`
/// answers mean the model chose NONE.
pub fn parse_llm_reply(reply: &str) -> Option<(Option<usize>, f32)> {
	let answer_re = Regex::new(r"(?im)^\s*ANSWER:\s*(\d+|NONE)\s*$").ok()?;
	let confidence_re = Regex::new(r"(?im)^\s*CONFIDENCE:\s*([01](?:\.\d+)?)\s*$").ok()?;
	let answer_raw = answer_re.captures(reply)?.get(1)?.as_str().to_uppercase();
	let confidence: f32 = confidence_re.captures(reply)?.get(1)?.as_str().parse().ok()?;

	if !(0.0..=1.0).contains(&confidence) {
		return None;
	}

	let answer = if answer_raw == "NONE" { None } else { Some(answer_raw.parse().ok()?) };

	Some((answer, confidence))
}

/// Per-tier mapping statistics for CLI reporting.
pub async fn stats(pool: &PgPool) -> Result<Vec<MappingStat>> {
	ontology::mapping_stats(pool).await.map_err(Error::from)
}
