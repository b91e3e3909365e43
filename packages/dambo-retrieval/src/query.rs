//! Natural-language query mapper. Pattern extractors live in the domain
//! crate; this module composes them with the database catalogs into one
//! entity set per query.

use dambo_domain::{
	amount::{AmountRange, extract_amount_range},
	query::{
		AgeRange, Gender, expand_boost_keywords, extract_age, extract_gender, extract_keywords,
		has_coverage_keyword, match_company_aliases, match_core_company_keywords,
	},
};

use crate::catalogs::Catalogs;

/// Phrases that mark a query as asking for a concrete amount even when no
/// parseable amount appears in it.
const AMOUNT_QUERY_KEYWORDS: &[&str] = &["얼마", "가입금액", "보장금액", "지급금액"];

#[derive(Debug, Default)]
pub struct QueryEntities {
	/// Canonical company keywords, alias matches first.
	pub companies: Vec<String>,
	pub products: Vec<String>,
	pub coverage_names: Vec<String>,
	pub coverage_ids: Vec<i64>,
	pub diseases: Vec<String>,
	pub keywords: Vec<&'static str>,
	pub amount: Option<AmountRange>,
	pub gender: Option<Gender>,
	pub age: Option<AgeRange>,
}

impl QueryEntities {
	/// Seeds for the re-rank booster: matched coverage names first, then
	/// the fixed-vocabulary keywords, expanded through the boost families.
	pub fn boost_keywords(&self) -> Vec<String> {
		let mut seeds: Vec<String> = self.coverage_names.clone();

		seeds.extend(self.keywords.iter().map(|keyword| (*keyword).to_string()));

		expand_boost_keywords(&seeds)
	}

	pub fn is_comparison(&self) -> bool {
		self.companies.len() >= 2
	}
}

pub fn extract_entities(query: &str, catalogs: &Catalogs) -> QueryEntities {
	let mut companies = match_company_aliases(query);

	match_core_company_keywords(query, &mut companies);

	let coverage_matches = catalogs.match_coverage_names(query);

	QueryEntities {
		companies: companies.into_iter().map(str::to_string).collect(),
		products: catalogs
			.match_products(query)
			.into_iter()
			.map(|product| product.product_name.clone())
			.collect(),
		coverage_names: coverage_matches
			.iter()
			.map(|entry| entry.coverage_name.clone())
			.collect(),
		coverage_ids: coverage_matches.iter().filter_map(|entry| entry.id).collect(),
		diseases: catalogs
			.match_diseases(query)
			.into_iter()
			.map(|disease| disease.name.clone())
			.collect(),
		keywords: extract_keywords(query),
		amount: extract_amount_range(query),
		gender: extract_gender(query),
		age: extract_age(query),
	}
}

/// True when the answer should carry a concrete amount. Amount queries get
/// the proposal-scoped augmentation and the amount bonus during re-rank.
pub fn is_amount_query(query: &str, entities: &QueryEntities) -> bool {
	AMOUNT_QUERY_KEYWORDS.iter().any(|keyword| query.contains(keyword))
		|| has_coverage_keyword(query)
		|| entities.amount.is_some()
}

/// Broader predicate: the query targets a specific benefit, so proposal
/// table rows are the preferred hit shape.
pub fn is_coverage_query(query: &str, entities: &QueryEntities) -> bool {
	has_coverage_keyword(query)
		|| !entities.coverage_names.is_empty()
		|| !entities.coverage_ids.is_empty()
}
