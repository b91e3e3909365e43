//! ANN retriever with amount-query augmentation, a fallback ladder for
//! zero-hit coverage queries, and keyword-boost re-ranking.

use std::collections::HashSet;

use sqlx::PgPool;

use dambo_providers::embedding::Embedder;
use dambo_storage::{
	models::SearchHit,
	search::{self, SearchFilter},
};

use crate::{
	Error, Result,
	catalogs::Catalogs,
	filter,
	query::{self, QueryEntities},
};

/// Text markers showing a candidate actually states an amount. Used to
/// decide between the amount bonus and the dampened boost.
const AMOUNT_TEXT_MARKERS: &[&str] = &["가입금액:", "만원,", "천만원", "백만원"];

/// Per-matched-keyword boost and its cap.
const BOOST_PER_MATCH: f64 = 0.15;
const BOOST_CAP: f64 = 0.30;
const AMOUNT_BONUS: f64 = 0.25;
const NO_AMOUNT_DAMPING: f64 = 0.3;

/// Document types tried in order for each company in comparison mode.
const COMPANY_LADDER: &[Option<&str>] =
	&[Some("terms"), Some("business_spec"), Some("product_summary"), Some("proposal"), None];

#[derive(Debug)]
pub struct ScoredHit {
	pub hit: SearchHit,
	pub boost: f64,
	pub score: f64,
}

pub struct Retriever {
	pool: PgPool,
	embedder: Embedder,
	top_k: usize,
	ef_search: u32,
}

impl Retriever {
	pub fn new(pool: PgPool, embedder: Embedder, cfg: &dambo_config::Retrieval) -> Self {
		Self { pool, embedder, top_k: cfg.top_k as usize, ef_search: cfg.ef_search }
	}

	pub async fn search(&self, query_text: &str, catalogs: &Catalogs) -> Result<Vec<ScoredHit>> {
		let entities = query::extract_entities(query_text, catalogs);
		let filter = filter::build_filter(query_text, &entities, catalogs);
		let is_amount = query::is_amount_query(query_text, &entities);
		let is_coverage = query::is_coverage_query(query_text, &entities);
		let query_vec = self.embed(query_text).await?;
		let limit = candidate_limit(self.top_k);
		let mut candidates =
			search::vector_search(&self.pool, &query_vec, &filter, limit, self.ef_search).await?;

		// Proposal documents hold the canonical amounts, so amount questions
		// scoped to a company also pull proposal rows with the amount bound
		// lifted and merge them in.
		if is_amount && filter.company_id.is_some() {
			let augmented = search::vector_search(
				&self.pool,
				&query_vec,
				&filter.without_amount().with_doc_type(Some("proposal")),
				limit,
				self.ef_search,
			)
			.await?;

			merge_candidates(&mut candidates, augmented);
		}

		if candidates.is_empty() && is_coverage {
			for (tier, fallback) in fallback_filters(&filter).iter().enumerate() {
				candidates =
					search::vector_search(&self.pool, &query_vec, fallback, limit, self.ef_search)
						.await?;

				if !candidates.is_empty() {
					tracing::debug!(tier, hits = candidates.len(), "fallback tier produced hits");

					break;
				}
			}
		}

		let ranked = rank(candidates, &entities.boost_keywords(), is_amount, self.top_k);

		tracing::info!(query = query_text, hits = ranked.len(), "search finished");

		Ok(ranked)
	}

	/// Comparison mode: one candidate list per mentioned company, each
	/// found by walking the document-type ladder until a tier answers.
	pub async fn search_multi_company(
		&self,
		query_text: &str,
		catalogs: &Catalogs,
	) -> Result<Vec<(String, Vec<ScoredHit>)>> {
		let entities = query::extract_entities(query_text, catalogs);
		let is_amount = query::is_amount_query(query_text, &entities);
		let boost_keywords = entities.boost_keywords();
		let query_vec = self.embed(query_text).await?;
		let limit = candidate_limit(self.top_k);
		let mut results = Vec::new();

		for company in &entities.companies {
			let Some(company_id) = catalogs.company_id(company) else {
				tracing::warn!(company, "company not in catalog; skipping");

				continue;
			};
			let base = SearchFilter { company_id: Some(company_id), ..Default::default() };
			let mut candidates = Vec::new();

			for doc_type in COMPANY_LADDER {
				candidates = search::vector_search(
					&self.pool,
					&query_vec,
					&base.with_doc_type(*doc_type),
					limit,
					self.ef_search,
				)
				.await?;

				if !candidates.is_empty() {
					break;
				}
			}

			results.push((
				company.clone(),
				rank(candidates, &boost_keywords, is_amount, self.top_k),
			));
		}

		Ok(results)
	}

	pub fn entities(&self, query_text: &str, catalogs: &Catalogs) -> QueryEntities {
		query::extract_entities(query_text, catalogs)
	}

	async fn embed(&self, query_text: &str) -> Result<Vec<f32>> {
		self.embedder
			.embed_query(query_text)
			.await
			.map_err(|err| Error::Provider(err.to_string()))
	}
}

fn candidate_limit(top_k: usize) -> i64 {
	(3 * top_k).max(30) as i64
}

/// Tiers A through E, widened one constraint at a time.
fn fallback_filters(filter: &SearchFilter) -> Vec<SearchFilter> {
	vec![
		filter.with_clause_type(None),
		filter.with_doc_type(Some("business_spec")).with_clause_type(Some("table_row")),
		filter.with_doc_type(Some("business_spec")).with_clause_type(None),
		filter.with_doc_type(Some("terms")).with_clause_type(None),
		filter.with_doc_type(None).with_clause_type(None),
	]
}

fn merge_candidates(primary: &mut Vec<SearchHit>, extra: Vec<SearchHit>) {
	let seen: HashSet<i64> = primary.iter().map(|hit| hit.clause_id).collect();

	primary.extend(extra.into_iter().filter(|hit| !seen.contains(&hit.clause_id)));
}

/// Boost for one candidate text. Keyword matches add up to the cap; amount
/// queries then reward texts that actually state an amount and dampen the
/// rest.
fn keyword_boost(text: &str, keywords: &[String], require_amount: bool) -> f64 {
	let matches = keywords.iter().filter(|keyword| text.contains(keyword.as_str())).count();
	let mut boost = (BOOST_PER_MATCH * matches as f64).min(BOOST_CAP);

	if require_amount {
		if AMOUNT_TEXT_MARKERS.iter().any(|marker| text.contains(marker)) {
			boost += AMOUNT_BONUS;
		} else {
			boost *= NO_AMOUNT_DAMPING;
		}
	}

	boost
}

fn rank(
	candidates: Vec<SearchHit>,
	boost_keywords: &[String],
	require_amount: bool,
	top_k: usize,
) -> Vec<ScoredHit> {
	let mut scored: Vec<ScoredHit> = candidates
		.into_iter()
		.map(|hit| {
			let boost = keyword_boost(&hit.clause_text, boost_keywords, require_amount);
			let score = hit.similarity + boost;

			ScoredHit { hit, boost, score }
		})
		.collect();

	scored.sort_by(|a, b| b.score.total_cmp(&a.score));
	scored.truncate(top_k);

	scored
}

#[cfg(test)]
mod tests {
	use serde_json::Value;

	use super::*;

	fn hit(clause_id: i64, text: &str, similarity: f64) -> SearchHit {
		SearchHit {
			clause_id,
			clause_type: "table_row".to_string(),
			clause_number: None,
			clause_title: None,
			clause_text: text.to_string(),
			structured_data: None,
			page_number: Some(1),
			similarity,
			metadata: Value::Null,
			doc_type: "proposal".to_string(),
			document_id: "doc".to_string(),
			product_id: 1,
			product_name: "건강보험".to_string(),
			company_name: "삼성화재".to_string(),
		}
	}

	fn keywords(words: &[&str]) -> Vec<String> {
		words.iter().map(|word| (*word).to_string()).collect()
	}

	#[test]
	fn boost_caps_at_two_matches() {
		let text = "암진단 및 암수술 진단비 보장";

		assert_eq!(keyword_boost(text, &keywords(&["암진단", "암수술", "진단비"]), false), 0.30);
		assert_eq!(keyword_boost(text, &keywords(&["암진단"]), false), 0.15);
		assert_eq!(keyword_boost(text, &keywords(&["입원"]), false), 0.0);
	}

	#[test]
	fn amount_queries_reward_texts_stating_amounts() {
		let with_amount = "암진단비, 가입금액: 3,000만원";
		let without = "암진단비를 보장합니다";
		let kw = keywords(&["암진단비"]);

		assert_eq!(keyword_boost(with_amount, &kw, true), 0.15 + 0.25);
		assert!((keyword_boost(without, &kw, true) - 0.15 * 0.3).abs() < 1e-9);
	}

	#[test]
	fn rank_orders_by_boosted_score_and_truncates() {
		let candidates = vec![
			hit(1, "면책기간 안내", 0.90),
			hit(2, "암진단비, 가입금액: 3,000만원", 0.80),
			hit(3, "계약 해지 절차", 0.50),
		];
		let ranked = rank(candidates, &keywords(&["암진단비"]), false, 2);

		assert_eq!(ranked.len(), 2);
		assert_eq!(ranked[0].hit.clause_id, 2);
		assert!((ranked[0].score - 0.95).abs() < 1e-9);
	}

	#[test]
	fn fallback_ladder_widens_in_order() {
		let primary = SearchFilter {
			doc_type: Some("proposal".to_string()),
			clause_type: Some("table_row".to_string()),
			company_id: Some(1),
			..Default::default()
		};
		let tiers = fallback_filters(&primary);

		assert_eq!(tiers.len(), 5);
		assert_eq!(tiers[0].doc_type.as_deref(), Some("proposal"));
		assert_eq!(tiers[0].clause_type, None);
		assert_eq!(tiers[1].doc_type.as_deref(), Some("business_spec"));
		assert_eq!(tiers[1].clause_type.as_deref(), Some("table_row"));
		assert_eq!(tiers[3].doc_type.as_deref(), Some("terms"));
		assert_eq!(tiers[4].doc_type, None);
		assert!(tiers.iter().all(|tier| tier.company_id == Some(1)));
	}

	#[test]
	fn merge_keeps_first_occurrence_per_clause() {
		let mut primary = vec![hit(1, "a", 0.9), hit(2, "b", 0.8)];
		let extra = vec![hit(2, "b again", 0.7), hit(3, "c", 0.6)];

		merge_candidates(&mut primary, extra);

		assert_eq!(
			primary.iter().map(|candidate| candidate.clause_id).collect::<Vec<_>>(),
			vec![1, 2, 3]
		);
	}

	#[test]
	fn candidate_pool_never_drops_below_thirty() {
		assert_eq!(candidate_limit(5), 30);
		assert_eq!(candidate_limit(20), 60);
	}
}
