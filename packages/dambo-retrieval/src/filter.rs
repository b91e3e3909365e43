//! Turns extracted query entities into the typed search filter.

use dambo_storage::search::SearchFilter;

use crate::{
	catalogs::Catalogs,
	query::{self, QueryEntities},
};

pub fn build_filter(query_text: &str, entities: &QueryEntities, catalogs: &Catalogs) -> SearchFilter {
	let mut filter = SearchFilter {
		company_id: entities
			.companies
			.first()
			.and_then(|canonical| catalogs.company_id(canonical)),
		coverage_ids: if entities.coverage_ids.is_empty() {
			None
		} else {
			Some(entities.coverage_ids.clone())
		},
		amount_min: entities.amount.and_then(|range| range.min),
		amount_max: entities.amount.and_then(|range| range.max),
		gender: entities.gender.map(|gender| gender.as_str().to_string()),
		age: entities.age.and_then(|age| age.min.or(age.max)).map(i32::from),
		..Default::default()
	};

	// Benefit questions answer best from proposal table rows, but only
	// when no boost keywords will re-rank a wider candidate set anyway.
	if query::is_coverage_query(query_text, entities) && entities.boost_keywords().is_empty() {
		filter.doc_type = Some("proposal".to_string());
		filter.clause_type = Some("table_row".to_string());
	}

	filter
}
