use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub storage: Storage,
	pub embedding: Embedding,
	pub llm: Llm,
	pub linker: Linker,
	pub ingest: Ingest,
	pub retrieval: Retrieval,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres_url: String,
	pub pool_max_conns: u32,
	pub vector_dim: u32,
}

/// Embedding backend selection. `backend` picks the model family; the env
/// overlay (§`apply_env`) can override every field here.
#[derive(Debug, Clone, Deserialize)]
pub struct Embedding {
	pub backend: String,
	pub model: Option<String>,
	pub device: Option<String>,
	pub dimensions: Option<u32>,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	pub batch_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Llm {
	pub enabled: bool,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Linker {
	pub fuzzy_threshold: u32,
	pub llm_confidence_floor: f32,
	pub llm_batch_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Ingest {
	pub converted_root: String,
	pub strict_coverage_validation: bool,
	pub checkpoint_path: Option<String>,
	pub embedding_batch_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub top_k: u32,
	pub ef_search: u32,
	pub max_context_length: u32,
}

impl Embedding {
	/// Model identifier actually sent to the backend, falling back to the
	/// family default when the config leaves it unset.
	pub fn model_name(&self) -> &str {
		if let Some(model) = self.model.as_deref() {
			return model;
		}

		match self.backend.as_str() {
			"fastembed" => "BAAI/bge-small-en-v1.5",
			"bge" => "BAAI/bge-m3",
			"jina" => "jina-embeddings-v3",
			"openai" => "text-embedding-3-small",
			_ => "",
		}
	}

	/// Effective vector dimension for the selected backend.
	pub fn dim(&self) -> u32 {
		if let Some(dim) = self.dimensions {
			return dim;
		}

		match self.backend.as_str() {
			"fastembed" => 384,
			"bge" => 1_024,
			"jina" => 1_024,
			"openai" => 1_536,
			_ => 0,
		}
	}
}
