//! In-memory snapshots of the entity catalogs the query mapper matches
//! against. Loaded once per session and refreshed explicitly; the tables
//! only change during ingestion runs.

use regex::Regex;
use sqlx::PgPool;

use dambo_storage::{
	models::{CompanyCatalogEntry, CoverageCatalogEntry, DiseaseCatalogEntry, ProductCatalogEntry},
	ontology,
};

use crate::Result;

/// Disease codes loaded into the catalog; the table holds thousands but
/// query matching only needs the common ones.
const DISEASE_CATALOG_LIMIT: i64 = 500;

#[derive(Debug, Default)]
pub struct Catalogs {
	pub companies: Vec<CompanyCatalogEntry>,
	pub products: Vec<ProductCatalogEntry>,
	pub coverage_names: Vec<CoverageCatalogEntry>,
	pub diseases: Vec<DiseaseCatalogEntry>,
}

impl Catalogs {
	pub async fn load(pool: &PgPool) -> Result<Self> {
		let catalogs = Self {
			companies: ontology::list_companies(pool).await?,
			products: ontology::list_products(pool).await?,
			coverage_names: ontology::list_coverage_names(pool).await?,
			diseases: ontology::list_diseases(pool, DISEASE_CATALOG_LIMIT).await?,
		};

		tracing::debug!(
			companies = catalogs.companies.len(),
			products = catalogs.products.len(),
			coverage_names = catalogs.coverage_names.len(),
			diseases = catalogs.diseases.len(),
			"catalogs loaded"
		);

		Ok(catalogs)
	}

	pub async fn refresh(&mut self, pool: &PgPool) -> Result<()> {
		*self = Self::load(pool).await?;

		Ok(())
	}

	/// Resolves a canonical company keyword ("삼성", "DB") to the stored
	/// company row whose name contains it.
	pub fn company_id(&self, canonical: &str) -> Option<i64> {
		self.companies
			.iter()
			.find(|company| company.company_name.contains(canonical))
			.map(|company| company.id)
	}

	pub fn match_products(&self, query: &str) -> Vec<&ProductCatalogEntry> {
		self.products
			.iter()
			.filter(|product| query.contains(product.product_name.as_str()))
			.collect()
	}

	/// Coverage names mentioned in the query. Exact containment wins;
	/// otherwise names whose trailing parenthetical is stripped are tried,
	/// so "암진단비" still finds "암진단비(유사암 제외)". Spaces are ignored
	/// on both sides.
	pub fn match_coverage_names(&self, query: &str) -> Vec<&CoverageCatalogEntry> {
		let normalized_query = strip_spaces(query);
		let exact: Vec<&CoverageCatalogEntry> = self
			.coverage_names
			.iter()
			.filter(|entry| normalized_query.contains(&strip_spaces(&entry.coverage_name)))
			.collect();

		if !exact.is_empty() {
			return exact;
		}

		self.coverage_names
			.iter()
			.filter(|entry| {
				let stripped = strip_suffix(&strip_spaces(&entry.coverage_name));

				stripped.chars().count() >= 2 && normalized_query.contains(&stripped)
			})
			.collect()
	}

	pub fn match_diseases(&self, query: &str) -> Vec<&DiseaseCatalogEntry> {
		self.diseases
			.iter()
			.filter(|disease| {
				disease.name.chars().count() >= 2 && query.contains(disease.name.as_str())
			})
			.collect()
	}
}

fn strip_spaces(text: &str) -> String {
	text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Drops a trailing parenthetical qualifier from a coverage name.
fn strip_suffix(name: &str) -> String {
	let Ok(re) = Regex::new(r"[(（][^)）]*[)）]$") else { return name.to_string() };

	re.replace(name, "").trim().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn catalogs() -> Catalogs {
		Catalogs {
			companies: vec![
				CompanyCatalogEntry {
					id: 1,
					company_name: "삼성화재".to_string(),
					company_code: "samsung".to_string(),
				},
				CompanyCatalogEntry {
					id: 2,
					company_name: "DB손해보험".to_string(),
					company_code: "db".to_string(),
				},
			],
			products: vec![ProductCatalogEntry {
				id: 7,
				product_name: "무배당 건강보험".to_string(),
				company_name: "삼성화재".to_string(),
			}],
			coverage_names: vec![
				CoverageCatalogEntry {
					id: Some(11),
					coverage_name: "암진단비(유사암 제외)".to_string(),
				},
				CoverageCatalogEntry { id: Some(12), coverage_name: "뇌출혈진단비".to_string() },
				CoverageCatalogEntry { id: None, coverage_name: "골절진단비".to_string() },
			],
			diseases: vec![DiseaseCatalogEntry {
				code: "C16".to_string(),
				name: "위암".to_string(),
			}],
		}
	}

	#[test]
	fn company_resolution_matches_by_containment() {
		let catalogs = catalogs();

		assert_eq!(catalogs.company_id("삼성"), Some(1));
		assert_eq!(catalogs.company_id("DB"), Some(2));
		assert_eq!(catalogs.company_id("한화"), None);
	}

	#[test]
	fn exact_coverage_containment_wins() {
		let catalogs = catalogs();
		let matched = catalogs.match_coverage_names("뇌출혈진단비 보장금액 알려줘");

		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].coverage_name, "뇌출혈진단비");
	}

	#[test]
	fn suffix_stripped_name_still_matches() {
		let catalogs = catalogs();
		let matched = catalogs.match_coverage_names("암진단비 얼마나 나와?");

		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].coverage_name, "암진단비(유사암 제외)");
	}

	#[test]
	fn spaces_are_ignored_on_both_sides() {
		let catalogs = catalogs();
		let matched = catalogs.match_coverage_names("골절 진단비 알려줘");

		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].id, None);
	}

	#[test]
	fn disease_names_match_by_containment() {
		let catalogs = catalogs();

		assert_eq!(catalogs.match_diseases("위암 보장되나요").len(), 1);
		assert!(catalogs.match_diseases("대장암").is_empty());
	}
}
