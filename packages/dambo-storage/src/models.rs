use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct Company {
	pub id: i64,
	pub company_name: String,
	pub company_code: String,
	pub business_type: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Product {
	pub id: i64,
	pub company_id: i64,
	pub product_code: String,
	pub product_name: String,
	pub business_type: Option<String>,
	pub version: String,
	pub effective_date: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductVariant {
	pub id: i64,
	pub product_id: i64,
	pub variant_code: String,
	pub target_gender: Option<String>,
	pub target_age_range: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Document {
	pub id: i64,
	pub document_id: String,
	pub product_id: i64,
	pub variant_id: Option<i64>,
	pub doc_type: String,
	pub doc_subtype: Option<String>,
	pub file_path: Option<String>,
	pub total_pages: Option<i32>,
	pub attributes: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct DocumentClause {
	pub id: i64,
	pub document_id: i64,
	pub clause_type: String,
	pub clause_number: Option<String>,
	pub clause_title: Option<String>,
	pub clause_text: String,
	pub structured_data: Option<Value>,
	pub section_type: Option<String>,
	pub page_number: Option<i32>,
	pub hierarchy_level: i32,
	pub parent_clause_id: Option<i64>,
	pub created_at: OffsetDateTime,
}

/// Insert payload for a clause. The surrogate id and timestamp come from
/// the database.
#[derive(Clone, Debug)]
pub struct NewClause {
	pub clause_type: String,
	pub clause_number: Option<String>,
	pub clause_title: Option<String>,
	pub clause_text: String,
	pub structured_data: Option<Value>,
	pub section_type: Option<String>,
	pub page_number: Option<i32>,
	pub hierarchy_level: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Coverage {
	pub id: i64,
	pub product_id: i64,
	pub coverage_code: String,
	pub coverage_name: String,
	pub coverage_category: String,
	pub renewal_type: Option<String>,
	pub is_basic: bool,
	pub clause_number: Option<String>,
	pub coverage_period: Option<String>,
	pub parent_coverage_id: Option<i64>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Benefit {
	pub id: i64,
	pub coverage_id: i64,
	pub benefit_name: String,
	pub benefit_type: String,
	pub benefit_amount: Option<i64>,
	pub benefit_amount_text: Option<String>,
	pub payment_frequency: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MappingStat {
	pub extraction_method: String,
	pub mapped_pairs: i64,
	pub distinct_clauses: i64,
}

/// Catalog rows for the query-side entity caches.
#[derive(Debug, sqlx::FromRow)]
pub struct CompanyCatalogEntry {
	pub id: i64,
	pub company_name: String,
	pub company_code: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductCatalogEntry {
	pub id: i64,
	pub product_name: String,
	pub company_name: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CoverageCatalogEntry {
	pub id: Option<i64>,
	pub coverage_name: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct DiseaseCatalogEntry {
	pub code: String,
	pub name: String,
}

/// One ANN candidate with its joined document context.
#[derive(Debug, sqlx::FromRow)]
pub struct SearchHit {
	pub clause_id: i64,
	pub clause_type: String,
	pub clause_number: Option<String>,
	pub clause_title: Option<String>,
	pub clause_text: String,
	pub structured_data: Option<Value>,
	pub page_number: Option<i32>,
	pub similarity: f64,
	pub metadata: Value,
	pub doc_type: String,
	pub document_id: String,
	pub product_id: i64,
	pub product_name: String,
	pub company_name: String,
}

/// Coverage context joined onto a hit for context assembly.
#[derive(Debug, sqlx::FromRow)]
pub struct LinkedCoverage {
	pub coverage_id: i64,
	pub coverage_name: String,
	pub coverage_category: String,
	pub benefit_name: Option<String>,
	pub benefit_amount: Option<i64>,
	pub benefit_amount_text: Option<String>,
}
