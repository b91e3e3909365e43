use dambo_retrieval::{catalogs::Catalogs, context, retriever::ScoredHit};
use dambo_storage::{
	db::Db,
	documents, embeddings,
	models::NewClause,
	ontology::{self, NewCoverage},
	search::{self, SearchFilter},
};
use dambo_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set DAMBO_PG_DSN to run."]
async fn catalog_search_and_assembly_round_trip() {
	let Some(base_dsn) = dambo_testkit::env_dsn() else {
		eprintln!("Skipping catalog_search_and_assembly_round_trip; set DAMBO_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = dambo_config::Storage {
		postgres_url: test_db.dsn().to_string(),
		pool_max_conns: 2,
		vector_dim: 4,
	};
	let db = Db::connect(&cfg).await.expect("Failed to connect.");

	db.ensure_schema(4).await.expect("Failed to ensure schema.");

	let company_id = ontology::upsert_company(&db.pool, "삼성화재", "samsung", None)
		.await
		.expect("Failed to upsert company.");
	let product_id =
		ontology::upsert_product(&db.pool, company_id, "P001", "건강보험", None, "1.0", None)
			.await
			.expect("Failed to upsert product.");
	let attributes = serde_json::json!({});
	let document_pk = documents::upsert_document(
		&db.pool,
		"samsung_proposal_001",
		product_id,
		None,
		"proposal",
		None,
		None,
		Some(1),
		&attributes,
	)
	.await
	.expect("Failed to upsert document.");
	let structured = serde_json::json!({
		"coverage_name": "암진단비(유사암 제외)",
		"coverage_amount": "3,000만원",
	});
	let table_row = NewClause {
		clause_type: "table_row".to_string(),
		clause_number: None,
		clause_title: None,
		clause_text: "암진단비(유사암 제외), 가입금액: 3,000만원".to_string(),
		structured_data: Some(structured.clone()),
		section_type: None,
		page_number: Some(1),
		hierarchy_level: 0,
	};
	let article = NewClause {
		clause_type: "article".to_string(),
		clause_number: Some("제1조".to_string()),
		clause_title: Some("목적".to_string()),
		clause_text: "이 약관은 보험계약의 내용을 정합니다.".to_string(),
		structured_data: None,
		section_type: None,
		page_number: Some(1),
		hierarchy_level: 0,
	};
	let row_clause_id = documents::insert_clause(&db.pool, document_pk, &table_row)
		.await
		.expect("Failed to insert clause.");
	let article_clause_id = documents::insert_clause(&db.pool, document_pk, &article)
		.await
		.expect("Failed to insert clause.");
	let coverage_id = ontology::upsert_coverage(
		&db.pool,
		&NewCoverage {
			product_id,
			coverage_code: "CAN001".to_string(),
			coverage_name: "암진단비(유사암 제외)".to_string(),
			coverage_category: "cancer_diagnosis".to_string(),
			renewal_type: None,
			is_basic: true,
			clause_number: None,
			coverage_period: None,
		},
	)
	.await
	.expect("Failed to upsert coverage.");

	ontology::insert_clause_coverage(&db.pool, row_clause_id, coverage_id, 1.0, "exact_match")
		.await
		.expect("Failed to link clause.");

	let row_metadata = serde_json::json!({
		"clause_type": "table_row",
		"doc_type": "proposal",
		"product_id": product_id,
		"coverage_ids": [coverage_id],
		"structured_data": structured,
	});
	let article_metadata = serde_json::json!({
		"clause_type": "article",
		"doc_type": "proposal",
		"product_id": product_id,
		"coverage_ids": [],
	});

	embeddings::insert_clause_embedding(
		&db.pool,
		row_clause_id,
		&[1.0, 0.0, 0.0, 0.0],
		"test-model",
		&row_metadata,
	)
	.await
	.expect("Failed to insert embedding.");
	embeddings::insert_clause_embedding(
		&db.pool,
		article_clause_id,
		&[0.0, 1.0, 0.0, 0.0],
		"test-model",
		&article_metadata,
	)
	.await
	.expect("Failed to insert embedding.");

	let catalogs = Catalogs::load(&db.pool).await.expect("Failed to load catalogs.");

	assert_eq!(catalogs.company_id("삼성"), Some(company_id));
	assert!(
		catalogs
			.coverage_names
			.iter()
			.any(|entry| entry.coverage_name == "암진단비(유사암 제외)")
	);

	let filter = SearchFilter {
		company_id: Some(company_id),
		clause_type: Some("table_row".to_string()),
		amount_min: Some(30_000_000),
		..Default::default()
	};
	let hits = search::vector_search(&db.pool, &[1.0, 0.0, 0.0, 0.0], &filter, 30, 200)
		.await
		.expect("Failed to search.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].clause_id, row_clause_id);
	assert!(hits[0].similarity > 0.99);

	let scored = hits
		.into_iter()
		.map(|hit| {
			let score = hit.similarity;

			ScoredHit { hit, boost: 0.0, score }
		})
		.collect();
	let assembled = context::assemble(&db.pool, "암진단비 얼마야", scored, 4_000)
		.await
		.expect("Failed to assemble context.");

	assert_eq!(assembled.metadata.num_clauses, 1);
	assert!(assembled.context_text.contains("보장 정보:"));
	assert!(assembled.context_text.contains("암진단비(유사암 제외)"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
