use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
	#[error(transparent)]
	Storage(#[from] dambo_storage::Error),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("failed to read PDF, {0}")]
	Pdf(String),
	#[error("missing artifact at {}", path.display())]
	MissingArtifact { path: PathBuf },
	#[error("{message}")]
	Validation { message: String },
	#[error("provider call failed, {0}")]
	Provider(String),
}
