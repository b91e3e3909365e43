mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Embedding, Ingest, Linker, Llm, Retrieval, Storage};

use std::{env, fs, path::Path};

/// Recognized environment keys, applied over the file values in `load`.
const ENV_POSTGRES_URL: &str = "POSTGRES_URL";
const ENV_EMBEDDING_BACKEND: &str = "EMBEDDING_BACKEND";
const ENV_FASTEMBED_MODEL: &str = "FASTEMBED_MODEL";
const ENV_BGE_MODEL: &str = "BGE_MODEL";
const ENV_BGE_DEVICE: &str = "BGE_DEVICE";
const ENV_JINA_MODEL: &str = "JINA_MODEL";
const ENV_JINA_DIMENSION: &str = "JINA_DIMENSION";
const ENV_OPENAI_EMBEDDING_MODEL: &str = "OPENAI_EMBEDDING_MODEL";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_COVERAGE_VALIDATION_STRICT: &str = "COVERAGE_VALIDATION_STRICT";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env(&mut cfg)?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Overlays the recognized environment keys on top of the file values.
pub fn apply_env(cfg: &mut Config) -> Result<()> {
	if let Ok(url) = env::var(ENV_POSTGRES_URL)
		&& !url.trim().is_empty()
	{
		cfg.storage.postgres_url = url;
	}
	if let Ok(backend) = env::var(ENV_EMBEDDING_BACKEND)
		&& !backend.trim().is_empty()
	{
		cfg.embedding.backend = backend.trim().to_string();
	}

	let model_key = match cfg.embedding.backend.as_str() {
		"fastembed" => Some(ENV_FASTEMBED_MODEL),
		"bge" => Some(ENV_BGE_MODEL),
		"jina" => Some(ENV_JINA_MODEL),
		"openai" => Some(ENV_OPENAI_EMBEDDING_MODEL),
		_ => None,
	};

	if let Some(key) = model_key
		&& let Ok(model) = env::var(key)
		&& !model.trim().is_empty()
	{
		cfg.embedding.model = Some(model.trim().to_string());
	}
	if let Ok(device) = env::var(ENV_BGE_DEVICE)
		&& !device.trim().is_empty()
	{
		cfg.embedding.device = Some(device.trim().to_string());
	}
	if let Ok(dim) = env::var(ENV_JINA_DIMENSION)
		&& !dim.trim().is_empty()
	{
		let parsed = dim
			.trim()
			.parse::<u32>()
			.map_err(|_| Error::EnvValue { key: ENV_JINA_DIMENSION.to_string() })?;

		cfg.embedding.dimensions = Some(parsed);
	}
	if cfg.embedding.backend == "openai"
		&& let Ok(key) = env::var(ENV_OPENAI_API_KEY)
		&& !key.trim().is_empty()
	{
		cfg.embedding.api_key = key;
	}
	if let Ok(strict) = env::var(ENV_COVERAGE_VALIDATION_STRICT) {
		cfg.ingest.strict_coverage_validation = match strict.trim() {
			"1" => true,
			"0" | "" => false,
			_ => return Err(Error::EnvValue { key: ENV_COVERAGE_VALIDATION_STRICT.to_string() }),
		};
	}

	Ok(())
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres_url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres_url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.embedding.backend.as_str(), "fastembed" | "bge" | "jina" | "openai") {
		return Err(Error::Validation {
			message: "embedding.backend must be one of fastembed, bge, jina, or openai.".to_string(),
		});
	}
	if cfg.embedding.dim() == 0 {
		return Err(Error::Validation {
			message: "embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.embedding.dim() != cfg.storage.vector_dim {
		return Err(Error::Validation {
			message: "embedding.dimensions must match storage.vector_dim.".to_string(),
		});
	}
	if cfg.embedding.backend == "jina"
		&& let Some(dim) = cfg.embedding.dimensions
		&& !matches!(dim, 512 | 1_024)
	{
		return Err(Error::Validation {
			message: "embedding.dimensions must be 512 or 1024 for the jina backend.".to_string(),
		});
	}
	if cfg.embedding.batch_size == 0 {
		return Err(Error::Validation {
			message: "embedding.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.llm.enabled {
		if cfg.llm.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: "llm.api_base must be non-empty when llm.enabled is true.".to_string(),
			});
		}
		if cfg.llm.model.trim().is_empty() {
			return Err(Error::Validation {
				message: "llm.model must be non-empty when llm.enabled is true.".to_string(),
			});
		}
		if !cfg.llm.temperature.is_finite() || cfg.llm.temperature < 0.0 {
			return Err(Error::Validation {
				message: "llm.temperature must be a finite number, zero or greater.".to_string(),
			});
		}
	}
	if cfg.linker.fuzzy_threshold == 0 || cfg.linker.fuzzy_threshold > 100 {
		return Err(Error::Validation {
			message: "linker.fuzzy_threshold must be in the range 1-100.".to_string(),
		});
	}
	if !cfg.linker.llm_confidence_floor.is_finite()
		|| !(0.0..=1.0).contains(&cfg.linker.llm_confidence_floor)
	{
		return Err(Error::Validation {
			message: "linker.llm_confidence_floor must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.ingest.converted_root.trim().is_empty() {
		return Err(Error::Validation {
			message: "ingest.converted_root must be non-empty.".to_string(),
		});
	}
	if cfg.ingest.embedding_batch_size == 0 {
		return Err(Error::Validation {
			message: "ingest.embedding_batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.ef_search == 0 {
		return Err(Error::Validation {
			message: "retrieval.ef_search must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_context_length == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_context_length must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.embedding.model.as_deref().map(|model| model.trim().is_empty()).unwrap_or(false) {
		cfg.embedding.model = None;
	}
	if cfg.embedding.device.as_deref().map(|device| device.trim().is_empty()).unwrap_or(false) {
		cfg.embedding.device = None;
	}
	if cfg
		.ingest
		.checkpoint_path
		.as_deref()
		.map(|path| path.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.ingest.checkpoint_path = None;
	}
}
