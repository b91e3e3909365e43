use dambo_storage::{db::Db, documents, ontology};
use dambo_testkit::TestDatabase;

fn storage_cfg(dsn: &str) -> dambo_config::Storage {
	dambo_config::Storage { postgres_url: dsn.to_string(), pool_max_conns: 2, vector_dim: 4 }
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set DAMBO_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = dambo_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set DAMBO_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&storage_cfg(test_db.dsn())).await.expect("Failed to connect.");

	db.ensure_schema(4).await.expect("Failed to ensure schema.");

	for table in ["company", "product", "document_clause", "coverage", "clause_embedding"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "table {table} missing after bootstrap");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set DAMBO_PG_DSN to run."]
async fn document_upsert_is_idempotent_on_document_id() {
	let Some(base_dsn) = dambo_testkit::env_dsn() else {
		eprintln!("Skipping document_upsert_is_idempotent_on_document_id; set DAMBO_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&storage_cfg(test_db.dsn())).await.expect("Failed to connect.");

	db.ensure_schema(4).await.expect("Failed to ensure schema.");

	let company_id = ontology::upsert_company(&db.pool, "삼성화재", "samsung", None)
		.await
		.expect("Failed to upsert company.");
	let product_id =
		ontology::upsert_product(&db.pool, company_id, "P001", "건강보험", None, "1.0", None)
			.await
			.expect("Failed to upsert product.");
	let attributes = serde_json::json!({});
	let first = documents::upsert_document(
		&db.pool,
		"doc_001",
		product_id,
		None,
		"terms",
		None,
		None,
		Some(10),
		&attributes,
	)
	.await
	.expect("Failed to upsert document.");
	let second = documents::upsert_document(
		&db.pool,
		"doc_001",
		product_id,
		None,
		"terms",
		None,
		None,
		Some(10),
		&attributes,
	)
	.await
	.expect("Failed to upsert document again.");

	assert_eq!(first, second);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
