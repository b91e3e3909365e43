use serde_json::Value;
use sqlx::PgExecutor;

use crate::{Error, Result};

pub fn validate_vector_dim(vec: &[f32], expected_dim: u32) -> Result<()> {
	if vec.len() != expected_dim as usize {
		return Err(Error::InvalidArgument(format!(
			"Embedding dimension {} does not match configured vector_dim {expected_dim}.",
			vec.len()
		)));
	}

	Ok(())
}

/// pgvector accepts its text literal form; values go over the wire as text
/// and are cast server-side.
pub fn format_vector_text(vec: &[f32]) -> String {
	let mut out = String::from("[");

	for (idx, value) in vec.iter().enumerate() {
		if idx > 0 {
			out.push(',');
		}
		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub async fn insert_clause_embedding<'e, E>(
	executor: E,
	clause_id: i64,
	vec: &[f32],
	model_name: &str,
	metadata: &Value,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let vec_text = format_vector_text(vec);

	sqlx::query(
		"\
INSERT INTO clause_embedding (clause_id, embedding, model_name, metadata)
VALUES ($1, $2::text::vector, $3, $4)
ON CONFLICT (clause_id) DO NOTHING",
	)
	.bind(clause_id)
	.bind(vec_text)
	.bind(model_name)
	.bind(metadata)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn count_embeddings<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clause_embedding")
		.fetch_one(executor)
		.await?;

	Ok(count)
}

/// Explicit purge used when switching embedding models. Nothing else ever
/// deletes embedding rows.
pub async fn purge_embeddings_for_model<'e, E>(executor: E, model_name: &str) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM clause_embedding WHERE model_name = $1")
		.bind(model_name)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
