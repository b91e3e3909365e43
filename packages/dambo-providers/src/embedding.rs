use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// HTTP embedding client over an OpenAI-compatible endpoint. The backend
/// family decides prompt prefixes and whether a dimensions field is sent.
pub struct Embedder {
	cfg: dambo_config::Embedding,
	client: Client,
}
impl Embedder {
	pub fn new(cfg: &dambo_config::Embedding) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg: cfg.clone(), client })
	}

	pub fn dim(&self) -> u32 {
		self.cfg.dim()
	}

	pub fn model_name(&self) -> &str {
		self.cfg.model_name()
	}

	pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		self.embed(texts, false).await
	}

	pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
		let mut vecs = self.embed(&[text.to_string()], true).await?;

		if vecs.len() != 1 {
			return Err(eyre::eyre!(
				"Embedding backend returned {} vectors for one query.",
				vecs.len()
			));
		}

		Ok(vecs.remove(0))
	}

	async fn embed(&self, texts: &[String], is_query: bool) -> Result<Vec<Vec<f32>>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let input = apply_prefixes(&self.cfg.backend, texts, is_query);
		let mut body = serde_json::json!({
			"model": self.cfg.model_name(),
			"input": input,
		});

		if let Some(dimensions) = self.cfg.dimensions {
			body["dimensions"] = dimensions.into();
		}
		if self.cfg.backend == "jina" {
			body["task"] =
				if is_query { "retrieval.query".into() } else { "retrieval.passage".into() };
		}

		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let vecs = parse_embedding_response(json)?;

		if vecs.len() != texts.len() {
			return Err(eyre::eyre!(
				"Embedding backend returned {} vectors for {} inputs.",
				vecs.len(),
				texts.len()
			));
		}

		Ok(vecs)
	}
}

fn apply_prefixes(backend: &str, texts: &[String], is_query: bool) -> Vec<String> {
	if backend != "bge" {
		return texts.to_vec();
	}

	let prefix = if is_query { "query: " } else { "passage: " };

	texts.iter().map(|text| format!("{prefix}{text}")).collect()
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing data array."))?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item
			.get("embedding")
			.and_then(|v| v.as_array())
			.ok_or_else(|| eyre::eyre!("Embedding item missing embedding array."))?;
		let mut vec = Vec::with_capacity(embedding.len());
		for value in embedding {
			let number =
				value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;
			vec.push(number as f32);
		}
		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
